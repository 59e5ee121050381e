use std::{sync::Arc, time::SystemTime};

use once_cell::sync::OnceCell;

use lazy_proxy::*;

// Define regular traits and implementor structs

trait Logger: Send + Sync {
    fn log(&self, content: &str);
    fn lines(&self) -> usize;
}

trait DateLogger: Send + Sync {
    fn log_date(&self);
}

/// Logger which stamps the date before its first line, through the date logger
struct LoggerImpl {
    dates: Arc<dyn DateLogger>,
    lines: parking_lot::Mutex<usize>,
}

impl Logger for LoggerImpl {
    fn log(&self, content: &str) {
        let first = {
            let mut lines = self.lines.lock();
            *lines += 1;
            *lines == 1
        };
        if first {
            self.dates.log_date();
        }
        println!("{}", content);
    }

    fn lines(&self) -> usize {
        *self.lines.lock()
    }
}

struct DateLoggerImpl {
    logger: Arc<dyn Logger>,
}

impl DateLogger for DateLoggerImpl {
    fn log_date(&self) {
        let secs = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map_or(0, |d| d.as_secs());
        println!("[{} lines logged, {}s since epoch]", self.logger.lines(), secs);
    }
}

// Generate the delegating implementations

proxy_interface! {
    dyn Logger {
        fn log(&self, content: &str);
        fn lines(&self) -> usize;
    }
    dyn DateLogger {
        fn log_date(&self);
    }
}

fn main() -> Result<(), ProxyError> {
    // Each logger needs the other one at construction time
    let dates_slot: Arc<OnceCell<Arc<dyn DateLogger>>> = Arc::default();

    let slot = dates_slot.clone();
    let logger = lazy_proxy::<dyn Logger, _>(move || {
        let dates = slot.get().cloned().expect("date logger is bound before use");
        Arc::new(LoggerImpl {
            dates,
            lines: parking_lot::Mutex::new(0),
        })
    })?;

    let l: Arc<dyn Logger> = logger.clone();
    let dates = lazy_proxy::<dyn DateLogger, _>(move || Arc::new(DateLoggerImpl { logger: l.clone() }))?;
    dates_slot.set(dates.clone()).ok();

    println!("logger computed: {}", LazyProxy::is_computed(&logger));
    logger.log("Hello");
    logger.log("World");
    println!("logger computed: {}", LazyProxy::is_computed(&logger));
    println!("date logger computed: {}", LazyProxy::is_computed(&dates));

    let descriptor = LazyProxy::descriptor(&logger);
    println!("{:?}", descriptor);

    // Final types with closed members are rejected
    struct Clock;
    impl Proxyable for Clock {
        fn shape() -> TypeShape {
            TypeShape::new("Clock", TypeKind::Final).final_function("now")
        }
    }
    if let Err(err) = lazy_proxy::<Clock, _>(|| Arc::new(Clock)) {
        println!("{}", err);
    }

    Ok(())
}
