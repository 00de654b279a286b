use std::panic;

use synchro::logger::Logger;

// Installing a global subscriber is irreversible, so this lives in its
// own test binary.
#[test]
fn second_global_logger_is_rejected() {
    Logger::new().with_filter("off").try_set_logger().unwrap();
    assert!(Logger::new().try_set_logger().is_err());

    let result = panic::catch_unwind(|| Logger::new().with_ansi(false).set_logger());
    assert!(result.is_err());
}
