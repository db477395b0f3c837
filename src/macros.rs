/// A `$t::default()` with the listed fields overridden
#[macro_export]
macro_rules! new_t {
    ($t:ty, $($k:ident = $v:expr),+ $(,)?) => {{
        let mut c = <$t>::default();
        $(c.$k = $v;)+
        c
    }};
}

/// One `#[test]` per listed type, each with `T` aliased to that type
#[macro_export]
macro_rules! test_t {
    ($name:ident[T: $($impl:ty)|*]() $body:tt) => {$(
        ::paste::paste! {
            #[test]
            fn [<test_ $name _ $impl:snake>]() {
                type T = $impl;
                $body
            }
        }
    )+};
}

#[macro_export]
macro_rules! assert_f64_approx {
    ($l:expr, $r:expr) => {
        $crate::assert_f64_approx!($l, $r, epsilon = f64::EPSILON)
    };
    ($l:expr, $r:expr, epsilon = $e:expr) => {{
        let (l, r): (f64, f64) = ($l, $r);
        assert!((l - r).abs() < $e, "assertion failed: {} !~ {} (epsilon {})", l, r, $e)
    }};
}
