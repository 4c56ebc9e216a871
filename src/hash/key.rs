//! Byte encodings of typed keys.
//!
//! Strings hash their UTF-8 bytes; integers hash their little-endian
//! representation. `usize`/`isize` are widened to 64 bits first, so the same
//! number hashes the same on 32- and 64-bit targets.

/// A value that can be inserted into or looked up in a filter.
///
/// # Examples
///
/// ```
/// use linebloom::hash::FilterKey;
///
/// assert_eq!("hi".with_key_bytes(<[u8]>::to_vec), b"hi".to_vec());
/// assert_eq!(7u64.with_key_bytes(<[u8]>::len), 8);
/// assert_eq!(
///     7usize.with_key_bytes(<[u8]>::to_vec),
///     7u64.with_key_bytes(<[u8]>::to_vec),
/// );
/// ```
pub trait FilterKey {
    /// Call `f` with this key's byte encoding.
    fn with_key_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R;
}

impl FilterKey for [u8] {
    #[inline]
    fn with_key_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(self)
    }
}

impl<const N: usize> FilterKey for [u8; N] {
    #[inline]
    fn with_key_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(self)
    }
}

impl FilterKey for Vec<u8> {
    #[inline]
    fn with_key_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(self)
    }
}

impl FilterKey for str {
    #[inline]
    fn with_key_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(self.as_bytes())
    }
}

impl FilterKey for String {
    #[inline]
    fn with_key_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(self.as_bytes())
    }
}

impl<T: FilterKey + ?Sized> FilterKey for &T {
    #[inline]
    fn with_key_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        (**self).with_key_bytes(f)
    }
}

macro_rules! impl_int_key {
    ($($t:ty),* $(,)?) => {
        $(
            impl FilterKey for $t {
                #[inline]
                fn with_key_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
                    f(&self.to_le_bytes())
                }
            }
        )*
    };
}

impl_int_key!(u8, u16, u32, u64, u128, i8, i16, i32, i64, i128);

impl FilterKey for usize {
    #[inline]
    fn with_key_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(&(*self as u64).to_le_bytes())
    }
}

impl FilterKey for isize {
    #[inline]
    fn with_key_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(&(*self as i64).to_le_bytes())
    }
}
