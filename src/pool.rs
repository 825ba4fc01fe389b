//! Size-classed free-list cache of reusable giants (the "giant stack").
//!
//! The arithmetic engine generates an enormous number of short-lived
//! scratch giants; going through the allocator for each of them would
//! dominate the cost of the small-operand operations. This module keeps,
//! per thread, one stack of free giants per power-of-two capacity class.
//! Borrowing pops a free giant of sufficient capacity (or allocates a
//! fresh one when the class is empty, or when the request exceeds the
//! largest class); dropping the handle pushes it back with its sign
//! reset to zero, so a later borrower never observes a stale magnitude.
//! Digit contents are deliberately left alone: the sign field controls
//! visibility, and digits beyond the active length are never read.
//!
//! The pools are thread-local, which makes concurrent use of the engine
//! from several threads safe without any locking; each thread simply
//! warms up its own cache. This is purely a performance layer: a bare
//! allocate/free pair would be semantically identical.

use core::cell::RefCell;
use core::ops::{Deref, DerefMut};

use crate::giant::Giant;

// Largest pooled class: capacity 2^MAX_CLASS digits. Larger requests
// fall through to plain allocation and are freed on return.
const MAX_CLASS: usize = 18;

struct Stacks {
    classes: Vec<Vec<Giant>>,
}

thread_local! {
    static POOL: RefCell<Stacks> = RefCell::new(Stacks {
        classes: (0..=MAX_CLASS).map(|_| Vec::new()).collect(),
    });
}

// Smallest class index whose capacity (2^i digits) is >= min_digits.
fn class_for(min_digits: usize) -> usize {
    let n = min_digits.max(1);
    (usize::BITS - (n - 1).leading_zeros()) as usize
}

/// A giant borrowed from the thread-local pool; dereferences to `Giant`
/// and returns to the pool when dropped.
pub struct PooledGiant {
    g: Option<Giant>,
    class: Option<usize>,
}

/// Borrows a zero-valued giant with capacity at least `min_digits` from
/// the current thread's pool.
pub fn borrow_giant(min_digits: usize) -> PooledGiant {
    let class = class_for(min_digits);
    if class > MAX_CLASS {
        return PooledGiant {
            g: Some(Giant::scratch(min_digits)),
            class: None,
        };
    }
    let recycled = POOL.with(|p| p.borrow_mut().classes[class].pop());
    let g = match recycled {
        Some(g) => g,
        None => Giant::scratch(1usize << class),
    };
    debug_assert!(g.is_zero());
    PooledGiant { g: Some(g), class: Some(class) }
}

/// Releases every cached giant held by the current thread's pool. The
/// pool refills lazily afterwards; this is only needed to give memory
/// back at the end of a large computation.
pub fn flush_pool() {
    let _ = POOL.try_with(|p| {
        for c in p.borrow_mut().classes.iter_mut() {
            c.clear();
        }
    });
}

impl Deref for PooledGiant {
    type Target = Giant;

    fn deref(&self) -> &Giant {
        self.g.as_ref().unwrap()
    }
}

impl DerefMut for PooledGiant {
    fn deref_mut(&mut self) -> &mut Giant {
        self.g.as_mut().unwrap()
    }
}

impl Drop for PooledGiant {
    fn drop(&mut self) {
        if let (Some(mut g), Some(class)) = (self.g.take(), self.class) {
            g.reset_sign();
            // During thread teardown the pool may already be gone; the
            // giant is then simply freed.
            let _ = POOL.try_with(|p| {
                p.borrow_mut().classes[class].push(g);
            });
        }
    }
}

// ========================================================================

#[cfg(test)]
mod tests {

    use super::{borrow_giant, class_for, flush_pool, MAX_CLASS};
    use crate::giant::Giant;

    #[test]
    fn class_rounding() {
        assert_eq!(class_for(0), 0);
        assert_eq!(class_for(1), 0);
        assert_eq!(class_for(2), 1);
        assert_eq!(class_for(3), 2);
        assert_eq!(class_for(4), 2);
        assert_eq!(class_for(5), 3);
        assert_eq!(class_for(1 << MAX_CLASS), MAX_CLASS);
        assert!(class_for((1 << MAX_CLASS) + 1) > MAX_CLASS);
    }

    #[test]
    fn borrow_capacity_and_reset() {
        flush_pool();
        {
            let mut g = borrow_giant(5);
            assert!(g.capacity() >= 5);
            assert!(g.is_zero());
            g.set_u64(0xDEAD);
        }
        // Same class again: the recycled giant must come back with a
        // zero sign even though its digits still hold the old bits.
        let g = borrow_giant(5);
        assert!(g.is_zero());
        assert_eq!(g.bit_length(), 0);
    }

    #[test]
    fn oversized_requests_bypass_pool() {
        let g = borrow_giant((1 << MAX_CLASS) + 7);
        assert!(g.capacity() >= (1 << MAX_CLASS) + 7);
        assert!(g.is_zero());
    }

    #[test]
    fn pooled_giant_behaves_like_giant() {
        let mut g = borrow_giant(8);
        g.set_u64(42);
        g.set_add(&Giant::from_u64(8));
        assert_eq!(*g, Giant::from_u64(50));
    }
}
