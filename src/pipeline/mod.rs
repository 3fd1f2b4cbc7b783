//! Per-document pipeline stages.
//!
//! Each submodule owns one step, and each external tool sits behind a trait
//! so the orchestrator can be driven by fakes in tests.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ inspect ──▶ preprocess? ──▶ ocr
//! (list)    (jobs)      (magick)        (ocrmypdf)
//! ```
//!
//! 1. [`input`]      — list the `*.pdf` files of the input directory
//! 2. [`inspect`]    — page count + size, feeding the parallelism heuristic
//! 3. [`preprocess`] — optional background removal into a temp artifact
//! 4. [`ocr`]        — run the engine with the resolved parameters
//!
//! [`command`] holds the process-spawning helper shared by the two tool stages.

pub mod command;
pub mod input;
pub mod inspect;
pub mod ocr;
pub mod preprocess;
