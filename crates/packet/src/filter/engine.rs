use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::clock::{Clock, SystemClock};
use crate::conf::{ConfigError, FilterConfiguration};
use crate::packet::Packet;

/// Accept-or-reject predicate over packets.
pub trait PacketFilter: Send + Sync {
    fn accept(&self, packet: &Packet) -> bool;
}

/// Rewrites a packet before it is filtered.
pub trait PacketTransformer: Send + Sync {
    fn transform(&self, packet: Packet) -> Packet;
}

#[derive(Debug)]
pub enum Verdict {
    Accept(Packet),
    Reject(Packet),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accept(_))
    }

    pub fn packet(&self) -> &Packet {
        match self {
            Verdict::Accept(p) | Verdict::Reject(p) => p,
        }
    }

    pub fn into_packet(self) -> Packet {
        match self {
            Verdict::Accept(p) | Verdict::Reject(p) => p,
        }
    }
}

/// One pipeline stage: an optional transformer followed by an optional
/// filter. A stage with neither accepts everything unchanged.
pub struct FilterInstance {
    name: &'static str,
    transformer: Option<Box<dyn PacketTransformer>>,
    filter: Option<Box<dyn PacketFilter>>,
}

impl FilterInstance {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            transformer: None,
            filter: None,
        }
    }

    pub fn with_filter(mut self, filter: impl PacketFilter + 'static) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    pub fn with_transformer(mut self, transformer: impl PacketTransformer + 'static) -> Self {
        self.transformer = Some(Box::new(transformer));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn evaluate(&self, packet: Packet) -> Verdict {
        let packet = match &self.transformer {
            Some(t) => t.transform(packet),
            None => packet,
        };
        match &self.filter {
            Some(f) if !f.accept(&packet) => Verdict::Reject(packet),
            _ => Verdict::Accept(packet),
        }
    }
}

impl fmt::Debug for FilterInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterInstance")
            .field("name", &self.name)
            .field("transforms", &self.transformer.is_some())
            .field("filters", &self.filter.is_some())
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct PipelineStats {
    pub evaluated: AtomicU64,
    pub accepted: AtomicU64,
    pub rejected: AtomicU64,
}

/// Ordered stages evaluated with AND semantics, stopping at the first
/// rejection.
#[derive(Debug, Default)]
pub struct Pipeline {
    stages: Vec<FilterInstance>,
    stats: PipelineStats,
}

impl Pipeline {
    pub fn new(stages: Vec<FilterInstance>) -> Self {
        Self {
            stages,
            stats: PipelineStats::default(),
        }
    }

    /// Validate every configuration, then instantiate them in order.
    pub fn build(configs: &[FilterConfiguration]) -> Result<Self, ConfigError> {
        Self::build_with_clock(configs, Arc::new(SystemClock))
    }

    pub fn build_with_clock(
        configs: &[FilterConfiguration],
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        for config in configs {
            config.validate()?;
        }
        let stages = configs
            .iter()
            .map(|c| c.instantiate_with_clock(Arc::clone(&clock)))
            .collect();
        Ok(Self::new(stages))
    }

    pub fn evaluate(&self, packet: Packet) -> Verdict {
        self.stats.evaluated.fetch_add(1, Ordering::Relaxed);

        let mut packet = packet;
        for stage in &self.stages {
            match stage.evaluate(packet) {
                Verdict::Accept(p) => packet = p,
                Verdict::Reject(p) => {
                    tracing::trace!(stage = stage.name(), "pipeline: packet rejected");
                    self.stats.rejected.fetch_add(1, Ordering::Relaxed);
                    return Verdict::Reject(p);
                }
            }
        }

        self.stats.accepted.fetch_add(1, Ordering::Relaxed);
        Verdict::Accept(packet)
    }

    pub fn stages(&self) -> impl Iterator<Item = &FilterInstance> {
        self.stages.iter()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// `(evaluated, accepted, rejected)`
    pub fn stats(&self) -> (u64, u64, u64) {
        (
            self.stats.evaluated.load(Ordering::Relaxed),
            self.stats.accepted.load(Ordering::Relaxed),
            self.stats.rejected.load(Ordering::Relaxed),
        )
    }
}
