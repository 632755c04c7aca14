#[macro_export]
macro_rules! unrecoverable {
    ($fmt:literal) => (
        panic!(concat!("unrecoverable: ", $fmt))
    );
    ($fmt:literal, $($arg:tt)+) => (
        panic!(concat!("unrecoverable: ", $fmt), $($arg)+)
    );
}
