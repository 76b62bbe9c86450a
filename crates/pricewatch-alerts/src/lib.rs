//! Price alert pipeline for pricewatch.
//!
//! Normalizes scraped rows, picks each model's cheapest in-stock offer,
//! decides which offers are worth an alert given what was sent before, sends
//! the alert, and remembers what was sent. [`run_cycle`] wires the steps
//! together for one scrape pass.

pub mod aggregate;
pub mod decide;
pub mod error;
pub mod normalize;
pub mod notify;
pub mod pipeline;
pub mod report;
pub mod state;

pub use aggregate::best_offers;
pub use decide::{decide, evaluate, triggered, DecisionPolicy, ModelDecision, Verdict};
pub use error::{NotifyError, ReportError, StateError};
pub use normalize::{dedupe_rows, normalize_row, parse_price};
pub use notify::{AlertMail, HttpMailRelay, MailNotifier, MailTransport, Notifier, NotifyFuture};
pub use pipeline::{collect_rows, run_cycle, CycleContext, CycleOutcome, CycleSummary};
pub use report::{build_report, JsonReportWriter, PriceReport, ReportRow, ReportSink};
pub use state::AlertStateStore;
