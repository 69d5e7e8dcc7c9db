/// A maximal contiguous span of breakpoints over which `count` servers of one type reside in one
/// power level without interruption. `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub server_type: usize,
    pub level: usize,
    pub start: usize,
    pub end: usize,
    pub count: i64,
}

impl Run {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

/// Splits a per-breakpoint count series into unit layers.
///
/// A rise by `delta` opens `delta` runs at that breakpoint, a fall by `delta` closes the most
/// recently opened ones first. Returns `(start, end, count)` triples with exclusive `end`.
/// Negative counts are treated as zero.
pub fn decompose(series: &[i64]) -> Vec<(usize, usize, i64)> {
    let mut open: Vec<(usize, i64)> = Vec::new();
    let mut runs = Vec::new();
    let mut previous = 0;

    for (k, &count) in series.iter().enumerate() {
        let count = count.max(0);

        if count > previous {
            open.push((k, count - previous));
        } else if count < previous {
            let mut closing = previous - count;

            while closing > 0 {
                let Some((start, layer)) = open.pop() else {
                    break;
                };

                let closed = layer.min(closing);
                runs.push((start, k, closed));

                if layer > closed {
                    open.push((start, layer - closed));
                }

                closing -= closed;
            }
        }

        previous = count;
    }

    while let Some((start, layer)) = open.pop() {
        runs.push((start, series.len(), layer));
    }

    runs
}
