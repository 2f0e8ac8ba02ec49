use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};
use log::{debug, info, warn};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{mpsc, watch};

use crate::events::InboundEvent;
use crate::ordering::order;
use crate::raw::RawItem;
use crate::report::{build_report, ReportSettings, ReportViewModel};

/// Settled dashboard state as seen by presentation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    /// Keyed by report id, iterated in display order.
    pub reports: IndexMap<String, ReportViewModel>,
    /// Deduplicated, in first-seen order.
    pub pipeline_names: IndexSet<String>,
    pub status_message: String,
}

impl DashboardSnapshot {
    pub fn ordered_reports(&self) -> impl Iterator<Item = &ReportViewModel> {
        self.reports.values()
    }
}

/// Single-writer owner of the dashboard state. Each mutation builds a complete
/// snapshot and publishes it in one step, so subscribers never see a partial
/// rebuild.
pub struct ReportStore {
    settings: ReportSettings,
    fixed_now: Option<DateTime<Utc>>,
    sender: watch::Sender<Arc<DashboardSnapshot>>,
}

impl ReportStore {
    pub fn new(settings: ReportSettings) -> Self {
        let (sender, _) = watch::channel(Arc::new(DashboardSnapshot::default()));
        Self {
            settings,
            fixed_now: None,
            sender,
        }
    }

    /// Pins the clock used for stability labels.
    pub fn with_fixed_now(mut self, now: DateTime<Utc>) -> Self {
        self.fixed_now = Some(now);
        self
    }

    fn now(&self) -> DateTime<Utc> {
        self.fixed_now.unwrap_or_else(Utc::now)
    }

    pub fn snapshot(&self) -> Arc<DashboardSnapshot> {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<DashboardSnapshot>> {
        self.sender.subscribe()
    }

    fn publish(&self, next: DashboardSnapshot) {
        self.sender.send_replace(Arc::new(next));
    }

    pub fn apply(&mut self, event: InboundEvent) {
        debug!("Applying {} event", event.name());

        match event {
            InboundEvent::ReportsUpdated(items) => {
                self.on_reports_updated(items);
            }
            InboundEvent::PipelineNames(names) => self.on_pipeline_names_updated(names),
            InboundEvent::Message(message) => self.on_message(message),
        }
    }

    /// Rebuilds every report from the payload and replaces the stored
    /// collection. Items that fail to decode are skipped. Returns the number of
    /// reports published.
    pub fn on_reports_updated(&mut self, items: Vec<Value>) -> usize {
        let now = self.now();
        let received = items.len();

        let mut by_id: IndexMap<String, ReportViewModel> = IndexMap::with_capacity(received);
        for value in items {
            let item = match RawItem::from_value(value) {
                Ok(item) => item,
                Err(e) => {
                    warn!("Skipping report item: {e}");
                    continue;
                }
            };
            let report = build_report(&item, &self.settings, now);
            if by_id.insert(report.id.clone(), report).is_some() {
                warn!("Duplicate report id {} in update, keeping the later item", item.id);
            }
        }

        let keyed: IndexMap<String, ReportViewModel> = order(by_id.into_values().collect())
            .into_iter()
            .map(|report| (report.id.clone(), report))
            .collect();

        info!(
            "Rebuilt {} reports from {} items ({} failing)",
            keyed.len(),
            received,
            keyed.values().filter(|r| r.is_failing).count()
        );

        let published = keyed.len();
        let current = self.snapshot();
        self.publish(DashboardSnapshot {
            reports: keyed,
            pipeline_names: current.pipeline_names.clone(),
            status_message: current.status_message.clone(),
        });
        published
    }

    pub fn on_pipeline_names_updated(&mut self, names: Vec<String>) {
        let received = names.len();
        let names: IndexSet<String> = names.into_iter().collect();
        info!("Received {received} pipeline names ({} distinct)", names.len());

        let current = self.snapshot();
        self.publish(DashboardSnapshot {
            reports: current.reports.clone(),
            pipeline_names: names,
            status_message: current.status_message.clone(),
        });
    }

    pub fn on_message(&mut self, message: String) {
        info!("Status message: {message}");

        let current = self.snapshot();
        self.publish(DashboardSnapshot {
            reports: current.reports.clone(),
            pipeline_names: current.pipeline_names.clone(),
            status_message: message,
        });
    }

    /// Called by presentation once the message has been shown long enough.
    pub fn clear_message(&mut self) {
        self.on_message(String::new());
    }
}

/// Applies events in arrival order until the subscription's channel closes.
pub async fn run_event_loop(store: &mut ReportStore, mut events: mpsc::Receiver<InboundEvent>) {
    let mut processed = 0usize;

    while let Some(event) = events.recv().await {
        store.apply(event);
        processed += 1;
    }

    info!("Event stream closed after {processed} events");
}
