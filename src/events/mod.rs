//! TensorBoard event-log I/O
//!
//! A run directory holds one or more `events.out.tfevents.*` files, each a
//! sequence of TFRecord-framed protobuf `Event` messages. Only scalar
//! summaries are read; everything else in the file is skipped.
//!
//! # Example
//!
//! ```rust,no_run
//! use tensorboard_reducer::events::{load_runs, EventWriter};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut writer = EventWriter::create("runs/seed-1".as_ref())?;
//! writer.add_scalar("loss", 0, 0.9)?;
//! writer.close()?;
//!
//! let store = load_runs("runs/seed-*")?;
//! println!("{} runs", store.run_count());
//! # Ok(())
//! # }
//! ```

mod crc;
pub mod proto;
mod reader;
mod record;
mod writer;

pub use reader::{discover_runs, load_run, load_runs, EVENT_FILE_MARKER};
pub use writer::{EventWriter, FILE_VERSION};
