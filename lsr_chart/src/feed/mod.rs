pub mod binance;
pub mod dummy;
pub mod poller;
pub mod source;

pub use binance::BinanceRatioSource;
pub use dummy::DummySource;
pub use poller::{EventSink, Poller, PollerConfig, RepaintHook};
pub use source::SeriesSource;
