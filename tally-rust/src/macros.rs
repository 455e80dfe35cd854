pub(crate) const LOCK_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

/// Takes a parking_lot lock, giving up after [`LOCK_TIMEOUT`]. On timeout the lock
/// expression is logged under `$tag` and the enclosing fn returns `$code`.
#[doc(hidden)]
#[macro_export]
macro_rules! lock_or_return {
    ($acquire:ident, $kind:literal, $tag:expr, $lock:expr, $code:expr) => {
        match $lock.$acquire($crate::macros::LOCK_TIMEOUT) {
            Some(guard) => guard,
            None => {
                $crate::log_e!(
                    $tag,
                    "Timed out acquiring {} lock on {}",
                    $kind,
                    stringify!($lock)
                );
                return $code;
            }
        }
    };
}

#[macro_export]
macro_rules! read_lock_or_return {
    ($tag:expr, $lock:expr, $code:expr) => {
        $crate::lock_or_return!(try_read_for, "read", $tag, $lock, $code)
    };
}

#[macro_export]
macro_rules! write_lock_or_return {
    ($tag:expr, $lock:expr, $code:expr) => {
        $crate::lock_or_return!(try_write_for, "write", $tag, $lock, $code)
    };
}

#[macro_export]
macro_rules! write_lock_or_noop {
    ($tag:expr, $lock:expr) => {
        $crate::lock_or_return!(try_write_for, "write", $tag, $lock, ())
    };
}

/// For hand-written `Serialize` impls that skip unset options.
#[macro_export]
macro_rules! serialize_if_not_none {
    ($state:expr, $field_name:expr, $value:expr) => {
        if let Some(v) = $value {
            $state.serialize_field($field_name, v)?
        }
    };
}
