use std::cmp::Ordering;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::hash::Hash;
use std::hash::Hasher;
use std::marker::PhantomData;

/// Unique identifier trait for domain entities (`Seat`, hands, rooms, ...).
pub trait Unique<T = Self> {
    fn id(&self) -> ID<T>;
}

/// Generic ID wrapper giving compile-time type safety over a `uuid::Uuid`.
///
/// `ID<HandHistory>` and `ID<Seat>` cannot be confused even though both wrap
/// the same underlying representation.
pub struct ID<T> {
    inner: uuid::Uuid,
    marker: PhantomData<T>,
}

impl<T> ID<T> {
    pub fn inner(&self) -> uuid::Uuid {
        self.inner
    }
    /// Cast to a differently-marked ID while preserving the underlying uuid.
    pub fn cast<U>(self) -> ID<U> {
        ID {
            inner: self.inner,
            marker: PhantomData,
        }
    }
}

impl<T> From<ID<T>> for uuid::Uuid {
    fn from(id: ID<T>) -> Self {
        id.inner()
    }
}
impl<T> From<uuid::Uuid> for ID<T> {
    fn from(inner: uuid::Uuid) -> Self {
        Self {
            inner,
            marker: PhantomData,
        }
    }
}

impl<T> Default for ID<T> {
    /// UUIDv7 embeds a millisecond timestamp, so IDs sort creation-order —
    /// useful for monotonically increasing correlation ids.
    fn default() -> Self {
        Self {
            inner: uuid::Uuid::now_v7(),
            marker: PhantomData,
        }
    }
}

impl<T> Copy for ID<T> {}
impl<T> Clone for ID<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Eq for ID<T> {}
impl<T> PartialEq for ID<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}
impl<T> Ord for ID<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.cmp(&other.inner)
    }
}
impl<T> PartialOrd for ID<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl<T> Hash for ID<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.hash(state);
    }
}
impl<T> Debug for ID<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ID").field(&self.inner).finish()
    }
}
impl<T> Display for ID<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.inner, f)
    }
}

impl<T> serde::Serialize for ID<T> {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        self.inner.serialize(s)
    }
}
impl<'de, T> serde::Deserialize<'de> for ID<T> {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        Ok(Self::from(uuid::Uuid::deserialize(d)?))
    }
}

/// A monotonically increasing correlation id.
///
/// 128 bits, ULID-like: the high 64 bits are wall-clock milliseconds since
/// the epoch, the low 64 bits are a process-wide atomic sequence that resets
/// whenever the millisecond advances. Generation is strictly increasing
/// within a process regardless of clock resolution, which a bare
/// `Uuid::now_v7()` does not guarantee (its low bits are random, not
/// sequential, for ids minted in the same millisecond).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct CorrelationId(u128);

static LAST_MILLIS: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(0);
static SEQUENCE: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(0);

impl CorrelationId {
    /// A fresh id, guaranteed greater than any previously generated one in
    /// this process.
    pub fn next() -> Self {
        use std::sync::atomic::Ordering as AtomicOrdering;
        let millis = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system clock before epoch")
            .as_millis() as u64;
        let prior = LAST_MILLIS.swap(millis, AtomicOrdering::SeqCst);
        let seq = if prior == millis {
            SEQUENCE.fetch_add(1, AtomicOrdering::SeqCst) + 1
        } else {
            SEQUENCE.store(0, AtomicOrdering::SeqCst);
            0
        };
        Self(((millis as u128) << 64) | seq as u128)
    }
}

impl Display for CorrelationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correlation_ids_increase_monotonically() {
        let a = CorrelationId::next();
        let b = CorrelationId::next();
        assert!(b > a, "{b} should sort after {a}");
    }

    #[test]
    fn id_cast_preserves_uuid() {
        struct A;
        struct B;
        let a: ID<A> = ID::default();
        let b: ID<B> = a.cast();
        assert_eq!(a.inner(), b.inner());
    }
}
