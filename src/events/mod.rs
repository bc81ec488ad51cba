//! # Events Module
//!
//! Event-driven progress reporting for copy runs and drive monitoring.
//!
//! ## Design
//! The copy engine talks to a [`ProgressReporter`]. Any UI (CLI, GUI, web)
//! plugs in its own sink, or uses an [`EventChannel`] and drains the
//! receiver on another thread.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Progress(p) = event {
//!             println!("{}% {}", p.percentage, p.message);
//!         }
//!     }
//! });
//!
//! let report = CopyEngine::default().run_with_reporter(&request, &sender);
//! ```

mod channel;
mod reporter;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use reporter::{NullReporter, ProgressLog, ProgressReporter};
pub use types::*;
