use tracing::info;

/// Tracks which layer commands read from when no layer is named.
#[derive(Debug, Clone)]
pub struct LayerSelector {
    primary: String,
    current: String,
}

impl LayerSelector {
    pub fn new(primary: impl Into<String>) -> Self {
        let primary = primary.into();
        Self {
            current: primary.clone(),
            primary,
        }
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn primary(&self) -> &str {
        &self.primary
    }

    /// Switch the current layer; `None` returns to the primary layer.
    ///
    /// The name is not checked against any registry here. A bad name
    /// surfaces as `LayerNotFound` on the next read.
    pub fn switch(&mut self, layer: Option<&str>) {
        let next = match layer {
            Some(name) if !name.is_empty() => name,
            _ => self.primary.as_str(),
        };
        if next != self.current {
            info!("Current layer: {} -> {}", self.current, next);
        }
        self.current = next.to_string();
    }

    /// Resolve an optional explicit layer against the current one.
    /// An empty name counts as no name.
    pub fn resolve<'a>(&'a self, layer: Option<&'a str>) -> &'a str {
        match layer {
            Some(name) if !name.is_empty() => name,
            _ => &self.current,
        }
    }
}
