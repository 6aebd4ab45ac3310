pub mod extractor;
pub mod invoker;
