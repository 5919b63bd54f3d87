// src/timing.rs
use std::time::Instant;

/// Таймер фазы: пишет в лог затраченное время при выходе из области видимости.
///
/// ```ignore
/// let _t = Timed::info("Поиск седловин");
/// // ... работа ...
/// ```
pub struct Timed {
    name: &'static str,
    start: Instant,
    level: log::Level,
}

impl Timed {
    pub fn info(name: &'static str) -> Self {
        log::debug!("{name}...");
        Self {
            name,
            start: Instant::now(),
            level: log::Level::Info,
        }
    }

    pub fn debug(name: &'static str) -> Self {
        log::trace!("{name}...");
        Self {
            name,
            start: Instant::now(),
            level: log::Level::Debug,
        }
    }
}

impl Drop for Timed {
    fn drop(&mut self) {
        log::log!(self.level, "{}: {:.3?}", self.name, self.start.elapsed());
    }
}
