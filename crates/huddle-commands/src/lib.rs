//! # Huddle Commands
//! Everything between an inbound chat line and a Store call: the
//! quotation-aware tokenizer, the input-validation rules, the command
//! dispatcher and the response formatting.

pub mod dispatcher;
pub mod format;
pub mod rules;
pub mod tokenizer;

pub use dispatcher::Dispatcher;
pub use rules::Rule;
pub use tokenizer::tokenize;
