//! Process-wide target register.
//!
//! One producer publishes whole [`TargetDescriptor`] records; any number of readers take
//! snapshots. A snapshot is an `Arc` to an immutable record, so ticker, path and confidence
//! are always observed as the group the producer wrote.

use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq)]
pub struct TargetDescriptor {
    pub ticker: String,
    /// Round-trip shape: `path[0] == path[last]`.
    pub path: Vec<String>,
    /// Expected in `[0.0, 1.0]`; values outside are an upstream bug but are kept as-is.
    pub confidence: f64,
}

impl TargetDescriptor {
    pub fn round_trip(base: &str, ticker: &str, confidence: f64) -> Self {
        Self {
            ticker: ticker.to_string(),
            path: vec![base.to_string(), ticker.to_string(), base.to_string()],
            confidence,
        }
    }

    pub fn confidence_in_range(&self) -> bool {
        (0.0..=1.0).contains(&self.confidence)
    }
}

/// Write half. Held only by the signal producer.
#[derive(Debug)]
pub struct TargetWriter {
    tx: watch::Sender<Arc<TargetDescriptor>>,
}

/// Read half. Cheap to clone; one per dispatcher.
#[derive(Debug, Clone)]
pub struct TargetReader {
    rx: watch::Receiver<Arc<TargetDescriptor>>,
}

pub fn register(initial: TargetDescriptor) -> (TargetWriter, TargetReader) {
    let (tx, rx) = watch::channel(Arc::new(initial));
    (TargetWriter { tx }, TargetReader { rx })
}

impl TargetWriter {
    /// Replaces the current record. Never blocks, even with no live readers.
    pub fn publish(&self, descriptor: TargetDescriptor) {
        self.tx.send_replace(Arc::new(descriptor));
    }

    pub fn current(&self) -> Arc<TargetDescriptor> {
        self.tx.borrow().clone()
    }

    pub fn reader(&self) -> TargetReader {
        TargetReader {
            rx: self.tx.subscribe(),
        }
    }
}

impl TargetReader {
    pub fn snapshot(&self) -> Arc<TargetDescriptor> {
        self.rx.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_path_shape() {
        let d = TargetDescriptor::round_trip("USDC", "PEPE", 0.4);
        assert_eq!(d.path, vec!["USDC", "PEPE", "USDC"]);
        assert_eq!(d.path.first(), d.path.last());
        assert!(d.confidence_in_range());
        assert!(!TargetDescriptor::round_trip("USDC", "PEPE", 1.5).confidence_in_range());
    }

    #[test]
    fn test_readers_observe_latest_publish_as_a_group() {
        let (writer, reader) = register(TargetDescriptor::round_trip("USDC", "WETH", 0.0));
        let other = reader.clone();
        let held = reader.snapshot();

        writer.publish(TargetDescriptor::round_trip("USDC", "ARB", 0.9));

        let fresh = other.snapshot();
        assert_eq!(fresh.ticker, "ARB");
        assert_eq!(fresh.path[1], "ARB");
        assert_eq!(fresh.confidence, 0.9);
        // A snapshot taken earlier is immutable.
        assert_eq!(held.ticker, "WETH");
        assert_eq!(held.path[1], "WETH");
    }

    #[test]
    fn test_publish_without_readers_still_updates() {
        let (writer, reader) = register(TargetDescriptor::round_trip("USDC", "WETH", 0.0));
        drop(reader);
        writer.publish(TargetDescriptor::round_trip("USDC", "OP", 0.2));
        assert_eq!(writer.current().ticker, "OP");
        assert_eq!(writer.reader().snapshot().ticker, "OP");
    }
}
