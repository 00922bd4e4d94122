//! SqFt unit allocation engine for "Book My SqFt" plots.
//!
//! A plot is offered as a rectangular [`Grid`] of individually priced units.
//! Buyers toggle units into a selection, watch the running
//! [`SelectionSummary`], and finalize the selection into bookings. The
//! [`selection`] functions are pure snapshot-to-snapshot transitions;
//! [`BookingSession`] and [`PlotStore`] wrap them with listeners, logging,
//! metrics and authoritative checkout.
//!
//! # Example
//! ```
//! use sqft_grid::{PlotSpec, PlotStore};
//!
//! let mut store = PlotStore::new();
//! store.insert(PlotSpec::new("bms-plot-alpha", 5, 5, 25_000))?;
//!
//! let mut session = store.open_session("bms-plot-alpha")?;
//! session.toggle(2, 3)?;
//! let summary = session.toggle(0, 0)?;
//! assert_eq!(summary.total_cost, 50_000);
//!
//! let receipt = store.checkout(&mut session)?;
//! assert_eq!(receipt.labels, vec!["A1", "C4"]);
//! # Ok::<(), sqft_grid::GridError>(())
//! ```

pub mod audit;
pub mod error;
pub mod grid;
pub mod labels;
pub mod logging;
pub mod metrics;
pub mod plot;
pub mod render;
pub mod selection;
pub mod session;
pub mod store;
pub mod width;

pub use audit::{
    BookingAudit, BookingAuditEvent, BookingAuditEventBuilder, BookingAuditStage,
    BufferedBookingAudit, NullBookingAudit,
};
pub use error::{GridError, Result};
pub use grid::{Coord, Grid, GridCounts, Unit, UnitId, UnitStatus};
pub use labels::{Facing, LabelingScheme, UnitLabel, UnitMetadata};
pub use logging::{
    FileSink, LogEvent, LogFields, LogLevel, LogSink, Logger, LoggingError, LoggingResult,
    MemorySink, NullSink,
};
pub use metrics::{BookingMetrics, MetricSnapshot};
pub use plot::PlotSpec;
pub use render::{GridRenderer, RendererSettings};
pub use selection::{Rebased, SelectionSummary};
pub use session::{BookingReceipt, BookingSession, RefreshOutcome, SelectionListener, SessionConfig};
pub use store::PlotStore;
pub use width::display_width;
