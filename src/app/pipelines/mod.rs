pub mod price_pipeline;

pub use price_pipeline::PricePipeline;
