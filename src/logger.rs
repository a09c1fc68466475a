//! 日志初始化：浏览器中转发到 `console`，原生环境（测试、基准）使用 fmt 输出。

use std::sync::Once;

static INIT: Once = Once::new();

/// 可重复调用，只有第一次生效。
pub fn init_logging() {
    INIT.call_once(install);
}

#[cfg(target_arch = "wasm32")]
fn install() {
    use tracing_subscriber::filter::LevelFilter;
    use tracing_subscriber::prelude::*;

    let _ = tracing_subscriber::registry()
        .with(LevelFilter::DEBUG)
        .with(console::ConsoleLayer)
        .try_init();
}

#[cfg(not(target_arch = "wasm32"))]
fn install() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(target_arch = "wasm32")]
mod console {
    use std::fmt::{self, Write};

    use tracing::field::{Field, Visit};
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, Layer};
    use wasm_bindgen::JsValue;

    pub struct ConsoleLayer;

    #[derive(Default)]
    struct LineVisitor {
        message: String,
        fields: String,
    }

    impl Visit for LineVisitor {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            if field.name() == "message" {
                let _ = write!(self.message, "{value:?}");
            } else {
                let _ = write!(self.fields, " {}={:?}", field.name(), value);
            }
        }
    }

    impl<S: Subscriber> Layer<S> for ConsoleLayer {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut visitor = LineVisitor::default();
            event.record(&mut visitor);

            let metadata = event.metadata();
            let line = JsValue::from_str(&format!(
                "[{}] {}{}",
                metadata.target(),
                visitor.message,
                visitor.fields
            ));
            match *metadata.level() {
                Level::ERROR => web_sys::console::error_1(&line),
                Level::WARN => web_sys::console::warn_1(&line),
                Level::INFO => web_sys::console::info_1(&line),
                _ => web_sys::console::debug_1(&line),
            }
        }
    }
}
