//! # Events Module
//!
//! Observer channel for status text, progress and streamed results.
//!
//! ## Design
//! Every pipeline invocation takes an [`EventSender`]. There is no global
//! status state: a UI subscribes by creating a channel and handing the
//! sender to the run it wants to watch.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         match event {
//!             Event::Status(text) => println!("{}", text),
//!             Event::Group(GroupEvent::Created(g)) => println!("new group {}", g.id),
//!             _ => {}
//!         }
//!     }
//! });
//!
//! search.run_with_events(&CancellationToken::new(), &sender);
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
