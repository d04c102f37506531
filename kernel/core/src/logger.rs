use core::fmt::Display;
use core::fmt::Write;
use log::{Level, LevelFilter, Log};
use owo_colors::OwoColorize;
use uart_16550::SerialPort;
use unicode_segmentation::UnicodeSegmentation;

/// COM1.
const SERIAL_PORT: u16 = 0x3f8;

struct Inner {
    serial_port: SerialPort,
}

impl Inner {
    fn write_with_color(&mut self, color: Color, string: impl Display) {
        let string: &dyn Display = match color {
            Color::Default => &string,
            Color::Gray => &string.dimmed(),
            Color::BrightRed => &string.bright_red(),
            Color::BrightYellow => &string.bright_yellow(),
            Color::BrightBlue => &string.bright_blue(),
            Color::BrightCyan => &string.bright_cyan(),
            Color::BrightMagenta => &string.bright_magenta(),
        };
        let mut writer = WriterWithCr::new(&mut self.serial_port);
        // Nowhere to report a failed serial write.
        let _ = write!(writer, "{string}");
    }
}

struct KernelLogger {
    inner: spin::Mutex<Inner>,
}

static LOGGER: KernelLogger = KernelLogger {
    inner: spin::Mutex::new(Inner {
        serial_port: unsafe { SerialPort::new(SERIAL_PORT) },
    }),
};

impl Log for KernelLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        let mut inner = self.inner.lock();
        let level = record.level();
        inner.write_with_color(
            match level {
                Level::Error => Color::BrightRed,
                Level::Warn => Color::BrightYellow,
                Level::Info => Color::BrightBlue,
                Level::Debug => Color::BrightCyan,
                Level::Trace => Color::BrightMagenta,
            },
            format_args!("{level:5} "),
        );
        inner.write_with_color(Color::Gray, format_args!("[{}] ", record.target()));
        inner.write_with_color(Color::Default, record.args());
        inner.write_with_color(Color::Default, "\n");
    }

    fn flush(&self) {}
}

/// Initialise COM1 and install the serial logger. Debug records from the
/// filesystem are kept; trace is dropped.
pub fn init() -> Result<(), log::SetLoggerError> {
    LOGGER.inner.lock().serial_port.init();
    log::set_max_level(LevelFilter::Debug);
    log::set_logger(&LOGGER)
}

struct WriterWithCr<T> {
    writer: T,
}

impl<T> WriterWithCr<T> {
    const fn new(writer: T) -> Self {
        Self { writer }
    }
}

impl<T: Write> Write for WriterWithCr<T> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        for c in s.graphemes(true) {
            match c {
                "\n" => self.writer.write_str("\r\n")?,
                s => self.writer.write_str(s)?,
            }
        }
        Ok(())
    }
}

enum Color {
    Default,
    Gray,
    BrightRed,
    BrightYellow,
    BrightBlue,
    BrightCyan,
    BrightMagenta,
}
