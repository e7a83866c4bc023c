use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

/// Fixed capacity sample store written from interrupt context.
///
/// Writes never block and always overwrite the oldest slot. The read cursor
/// persists between reads, `mean` walks one full cycle and so leaves it where
/// it started. Slots never written read as zero.
pub struct RingBuffer<const N: usize> {
    buffer: [AtomicU32; N],
    write: AtomicUsize,
    read: AtomicUsize,
}

impl<const N: usize> RingBuffer<N> {
    const ZERO: AtomicU32 = AtomicU32::new(0);

    pub const fn new() -> Self {
        Self { buffer: [Self::ZERO; N], write: AtomicUsize::new(0), read: AtomicUsize::new(0) }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn write(&self, value: u32) {
        let write = self.write.load(Ordering::Relaxed);
        self.buffer[write].store(value, Ordering::Relaxed);
        self.write.store((write + 1) % N, Ordering::Release);
    }

    /// Returns the entry under the read cursor and advances it. Does not check
    /// whether reading has overtaken writing.
    pub fn read(&self) -> u32 {
        let read = self.read.load(Ordering::Relaxed);
        self.read.store((read + 1) % N, Ordering::Relaxed);
        self.buffer[read].load(Ordering::Acquire)
    }

    pub fn read_cursor(&self) -> usize {
        self.read.load(Ordering::Relaxed)
    }

    pub fn write_cursor(&self) -> usize {
        self.write.load(Ordering::Relaxed)
    }

    /// Mean of all `N` entries rounded half up, `(2 * sum + N) / (2 * N)`.
    pub fn mean(&self) -> u32 {
        let sum: u64 = (0..N).map(|_| self.read() as u64).sum();
        ((2 * sum + N as u64) / (2 * N as u64)) as u32
    }
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

mod test {
    #[test]
    fn test_ring_buffer_mean() {
        use pretty_assertions::assert_eq;

        use super::RingBuffer;

        let ring: RingBuffer<4> = RingBuffer::new();
        for i in 1..=4 {
            ring.write(i);
        }
        let cursor = ring.read_cursor();
        assert_eq!(ring.mean(), 3);
        assert_eq!(ring.read_cursor(), cursor);
    }

    #[test]
    fn test_ring_buffer_mean_from_moved_cursor() {
        use super::RingBuffer;

        let ring: RingBuffer<3> = RingBuffer::new();
        for value in [10, 11, 13] {
            ring.write(value);
        }
        assert_eq!(ring.read(), 10);
        assert_eq!(ring.read_cursor(), 1);
        // 34 / 3 = 11.33
        assert_eq!(ring.mean(), 11);
        assert_eq!(ring.read_cursor(), 1);
    }

    #[test]
    fn test_ring_buffer_overwrite() {
        use super::RingBuffer;

        let ring: RingBuffer<4> = RingBuffer::new();
        for i in 0..10 {
            ring.write(i);
        }
        assert_eq!(ring.write_cursor(), 2);
        assert_eq!(ring.read(), 8);
        assert_eq!(ring.read(), 9);
        assert_eq!(ring.read(), 6);
        assert_eq!(ring.read(), 7);
        assert_eq!(ring.read(), 8);
    }

    #[test]
    fn test_ring_buffer_unwritten_slots() {
        use super::RingBuffer;

        let ring: RingBuffer<4> = RingBuffer::new();
        ring.write(100);
        // (200 + 4) / 8
        assert_eq!(ring.mean(), 25);
        ring.write(4095);
        ring.write(4095);
        ring.write(4095);
        assert_eq!(ring.mean(), 3096);
    }
}
