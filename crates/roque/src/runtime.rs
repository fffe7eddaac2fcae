//   Copyright (c) 2024-2026 Anton Kundenko <singaraiona@gmail.com>
//   All rights reserved.
//
//   Permission is hereby granted, free of charge, to any person obtaining a copy
//   of this software and associated documentation files (the "Software"), to deal
//   in the Software without restriction, including without limitation the rights
//   to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
//   copies of the Software, and to permit persons to whom the Software is
//   furnished to do so, subject to the following conditions:
//
//   The above copyright notice and this permission notice shall be included in all
//   copies or substantial portions of the Software.
//
//   THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
//   IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
//   FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
//   AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
//   LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
//   OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
//   SOFTWARE.

//! Process-global engine state: worker-pool sizing for row-wise operations.
//!
//! Initialization is lazy and idempotent; the first caller wins and every
//! later call observes the same configuration.

use std::sync::OnceLock;

use tracing::debug;

static WORKERS: OnceLock<usize> = OnceLock::new();

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Initialize the engine runtime. Safe to call any number of times from any
/// thread; only the first call has an effect. `workers = 0` means
/// auto-detect.
pub fn init(workers: usize) {
    let n = WORKERS.get_or_init(|| {
        let n = if workers == 0 {
            default_workers()
        } else {
            workers
        };
        debug!(workers = n, "engine runtime initialized");
        n
    });
    let _ = n;
}

/// Ensure the runtime is initialized with defaults.
pub fn ensure_initialized() {
    init(0);
}

/// Worker count for parallel row iteration. Initializes on first use.
pub(crate) fn workers() -> usize {
    *WORKERS.get_or_init(default_workers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        ensure_initialized();
        let first = workers();
        init(first + 7);
        assert_eq!(workers(), first);
    }
}
