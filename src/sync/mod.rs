use core::{
    cell::UnsafeCell,
    ptr,
    sync::atomic::{fence, AtomicBool, AtomicU32, Ordering},
};

/// Single-writer cell for multi-word values shared between interrupt handlers
/// and the main loop. Readers never block the writer, they retry on a torn copy.
pub struct ReadSpinLock<T> {
    write_lock: AtomicBool,
    version: AtomicU32,
    data: UnsafeCell<T>,
}

impl<T: Default> Default for ReadSpinLock<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> ReadSpinLock<T> {
    pub const fn new(data: T) -> Self {
        Self {
            write_lock: AtomicBool::new(false),
            version: AtomicU32::new(0),
            data: UnsafeCell::new(data),
        }
    }

    pub fn version(&self) -> u32 {
        self.version.load(Ordering::Acquire) >> 1
    }
}

impl<T: Copy> ReadSpinLock<T> {
    /// Fails with `Err(true)` when another writer holds the lock.
    pub fn write(&self, data: T) -> Result<(), bool> {
        let relaxed = Ordering::Relaxed;
        self.write_lock.compare_exchange(false, true, Ordering::Acquire, relaxed)?;
        // Odd version marks a write in progress
        self.version.fetch_add(1, relaxed);
        fence(Ordering::Release);
        unsafe { ptr::write_volatile(self.data.get(), data) };
        self.version.fetch_add(1, Ordering::Release);
        self.write_lock.store(false, Ordering::Release);
        Ok(())
    }

    pub fn read(&self) -> T {
        loop {
            let version = self.version.load(Ordering::Acquire);
            if version & 1 == 1 {
                core::hint::spin_loop();
                continue;
            }
            let data = unsafe { ptr::read_volatile(self.data.get()) };
            fence(Ordering::Acquire);
            if version == self.version.load(Ordering::Relaxed) {
                return data;
            }
        }
    }
}

unsafe impl<T: Send> Sync for ReadSpinLock<T> {}
unsafe impl<T: Send> Send for ReadSpinLock<T> {}

mod test {
    #[test]
    fn test_read_spin_lock() {
        use super::ReadSpinLock;

        let lock = ReadSpinLock::new((0u32, 0u32));
        assert_eq!(lock.read(), (0, 0));
        assert_eq!(lock.write((1, 2)), Ok(()));
        assert_eq!(lock.read(), (1, 2));
        assert_eq!(lock.version(), 1);
    }

    #[test]
    fn test_read_spin_lock_write_conflict() {
        use core::sync::atomic::Ordering;

        use super::ReadSpinLock;

        let lock = ReadSpinLock::new(0u8);
        lock.write_lock.store(true, Ordering::Relaxed);
        assert_eq!(lock.write(1), Err(true));
        assert_eq!(lock.read(), 0);
    }

    #[test]
    fn test_read_spin_lock_concurrent() {
        use std::sync::Arc;
        use std::thread;

        use super::ReadSpinLock;

        let lock = Arc::new(ReadSpinLock::new((0u64, 0u64)));
        let writer = {
            let lock = lock.clone();
            thread::spawn(move || {
                for i in 1..10_000u64 {
                    lock.write((i, i * 2)).ok();
                }
            })
        };
        for _ in 0..10_000 {
            let (a, b) = lock.read();
            assert_eq!(a * 2, b);
        }
        writer.join().ok();
    }
}
