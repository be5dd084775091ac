//! Flags that are either fixed or computed each time they are read.

use std::{fmt, sync::Arc};

#[derive(Clone)]
pub enum Toggle {
    Fixed(bool),
    Dynamic(Arc<dyn Fn() -> bool + Send + Sync>),
}

impl Toggle {
    pub fn dynamic(predicate: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        Toggle::Dynamic(Arc::new(predicate))
    }

    pub fn get(&self) -> bool {
        match self {
            Toggle::Fixed(value) => *value,
            Toggle::Dynamic(predicate) => predicate(),
        }
    }
}

impl Default for Toggle {
    fn default() -> Self {
        Toggle::Fixed(true)
    }
}

impl From<bool> for Toggle {
    fn from(value: bool) -> Self {
        Toggle::Fixed(value)
    }
}

impl fmt::Debug for Toggle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Toggle::Fixed(value) => write!(f, "Fixed({})", value),
            Toggle::Dynamic(_) => write!(f, "Dynamic(<fn>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    #[test]
    fn dynamic_toggle_is_read_on_every_call() {
        let flag = Arc::new(AtomicBool::new(true));
        let toggle = {
            let flag = flag.clone();
            Toggle::dynamic(move || flag.load(Ordering::SeqCst))
        };
        assert!(toggle.get());
        flag.store(false, Ordering::SeqCst);
        assert!(!toggle.get());
    }
}
