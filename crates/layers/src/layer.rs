#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerId(pub u64);

/// Something that owns content on one map layer.
pub trait Layer {
    fn id(&self) -> LayerId;
}
