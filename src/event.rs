//! Live update messages and the bounded channel that carries them.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use maptopo::AttrValue;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, error::{SendError, TrySendError}};

use crate::classify::{Color, LegendOptions, NumberFormat, ScaleSpec};

/// A message from the host, consumed exactly once by the coordinator.
///
/// Wire form: `{"kind": "update-scale", "data": {...}}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "kebab-case")]
pub enum UpdateEvent {
    UpdateScale(ScaleUpdate),
    UpdateValues(ValuesUpdate),
    UpdateLegend(LegendUpdate),
}

impl UpdateEvent {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("[event] failed to parse update message")
    }

    /// Wire name of the event kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UpdateScale(_) => "update-scale",
            Self::UpdateValues(_) => "update-values",
            Self::UpdateLegend(_) => "update-legend",
        }
    }
}

/// New scale, optionally switching the colored attribute.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScaleUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_var: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub na_color: Option<Color>,
    #[serde(flatten)]
    pub scale: ScaleSpec,
}

/// Replacement values keyed by region id.
///
/// With `variable` set, values are first re-read from that attribute and the
/// explicit `values` are applied on top.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValuesUpdate {
    pub values: BTreeMap<String, AttrValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<BTreeMap<String, AttrValue>>,
}

/// Partial legend options; absent fields keep their current value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegendUpdate {
    pub title: Option<String>,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    #[serde(alias = "d3_format")]
    pub number_format: Option<NumberFormat>,
}

impl LegendUpdate {
    pub fn apply(&self, options: &LegendOptions) -> LegendOptions {
        let mut next = options.clone();
        if let Some(title) = &self.title { next.title = Some(title.clone()) }
        if let Some(prefix) = &self.prefix { next.prefix = prefix.clone() }
        if let Some(suffix) = &self.suffix { next.suffix = suffix.clone() }
        if let Some(format) = &self.number_format { next.number_format = Some(format.clone()) }
        next
    }
}

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

/// Producer half of the update bus, held by the host adapter.
#[derive(Clone, Debug)]
pub struct UpdateSender {
    tx: mpsc::Sender<UpdateEvent>,
}

/// Consumer half of the update bus, drained by the coordinator.
#[derive(Debug)]
pub struct UpdateReceiver {
    rx: mpsc::Receiver<UpdateEvent>,
}

/// Create a bounded update bus.  Events are delivered in send order.
pub fn update_channel(capacity: usize) -> (UpdateSender, UpdateReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (UpdateSender { tx }, UpdateReceiver { rx })
}

impl UpdateSender {
    /// Wait for capacity, then enqueue `event`.
    pub async fn send(&self, event: UpdateEvent) -> Result<(), SendError<UpdateEvent>> {
        self.tx.send(event).await
    }

    /// Enqueue without waiting; fails when the bus is full or closed.
    pub fn try_send(&self, event: UpdateEvent) -> Result<(), TrySendError<UpdateEvent>> {
        self.tx.try_send(event)
    }

    /// Parse a JSON message and enqueue it without waiting.
    pub fn try_send_json(&self, json: &str) -> Result<()> {
        let event = UpdateEvent::from_json(json)?;
        self.try_send(event).map_err(|e| anyhow::anyhow!("[event] failed to enqueue update: {e}"))
    }
}

impl UpdateReceiver {
    /// Next event, or `None` once every sender is gone and the queue is empty.
    pub async fn recv(&mut self) -> Option<UpdateEvent> {
        self.rx.recv().await
    }

    /// Next queued event without waiting.
    pub fn try_recv(&mut self) -> Option<UpdateEvent> {
        self.rx.try_recv().ok()
    }
}
