pub mod exporter;
pub mod fetcher;
pub mod parser;
pub mod reading;
pub mod renderer;
pub mod scroll;
pub mod toc;

pub use exporter::ArticleExporter;
pub use fetcher::ContentFetcher;
pub use parser::ContentParser;
pub use renderer::{ArticleRenderer, DiagramRenderer, MermaidEmbed};
pub use scroll::{ReadingSurface, ScrollEvents, ScrollTracker, Subscription, TrackerConfig, TrackerHandle};
