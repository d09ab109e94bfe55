/// One step of an edit script turning the reference sequence into the
/// hypothesis sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOp {
    Equal,
    /// Reference symbol with no hypothesis counterpart.
    Delete,
    /// Hypothesis symbol with no reference counterpart.
    Insert,
}

const UNREACHED: isize = -1;

/// Which neighbouring diagonal the furthest point on `k` is extended from,
/// and the x coordinate before the snake. `None` when neither neighbour
/// yields an in-grid move.
fn extend_from(
    v: &[isize],
    k: isize,
    d: isize,
    offset: isize,
    n: isize,
    m: isize,
) -> Option<(isize, isize)> {
    let at = |diag: isize| v[(diag + offset) as usize];

    // Insert: step down from diagonal k + 1.
    let down = if k < d {
        let x = at(k + 1);
        (x != UNREACHED && x - k <= m).then_some(x)
    } else {
        None
    };
    // Delete: step right from diagonal k - 1.
    let right = if k > -d {
        let x = at(k - 1);
        (x != UNREACHED && x + 1 <= n).then_some(x + 1)
    } else {
        None
    };

    match (down, right) {
        (Some(xd), Some(xr)) if xd >= xr => Some((k + 1, xd)),
        (_, Some(xr)) => Some((k - 1, xr)),
        (Some(xd), None) => Some((k + 1, xd)),
        (None, None) => None,
    }
}

/// Myers O(ND) shortest edit script between two symbol strings.
pub fn shortest_edit_script(a: &[u32], b: &[u32]) -> Vec<EditOp> {
    let n = a.len() as isize;
    let m = b.len() as isize;
    let max = n + m;
    if max == 0 {
        return Vec::new();
    }

    let offset = max + 1;
    let mut v = vec![UNREACHED; (2 * max + 3) as usize];
    let mut trace: Vec<Vec<isize>> = Vec::new();

    let snake = |mut x: isize, k: isize| {
        let mut y = x - k;
        while x < n && y < m && a[x as usize] == b[y as usize] {
            x += 1;
            y += 1;
        }
        x
    };

    // Round 0: the diagonal through the origin.
    let x0 = snake(0, 0);
    v[offset as usize] = x0;
    let mut found = x0 >= n && x0 >= m;
    let mut rounds = 0;

    while !found {
        rounds += 1;
        let d = rounds;
        trace.push(v.clone());
        let mut k = -d;
        while k <= d {
            let idx = (k + offset) as usize;
            if k < -m || k > n {
                v[idx] = UNREACHED;
                k += 2;
                continue;
            }
            v[idx] = match extend_from(&trace[(d - 1) as usize], k, d, offset, n, m) {
                Some((_, start)) => snake(start, k),
                None => UNREACHED,
            };
            if v[idx] >= n && v[idx] - k >= m {
                found = true;
                break;
            }
            k += 2;
        }
    }

    let mut ops = Vec::with_capacity((n + m) as usize);
    let mut x = n;
    let mut y = m;
    for d in (1..=rounds).rev() {
        let prev = &trace[(d - 1) as usize];
        let k = x - y;
        let Some((prev_k, start)) = extend_from(prev, k, d, offset, n, m) else {
            break;
        };
        // Snake back to where this round's edit landed; `y` is reset below.
        ops.extend(std::iter::repeat(EditOp::Equal).take((x - start).max(0) as usize));
        let prev_x = prev[(prev_k + offset) as usize];
        let prev_y = prev_x - prev_k;
        ops.push(if prev_k == k + 1 {
            EditOp::Insert
        } else {
            EditOp::Delete
        });
        x = prev_x;
        y = prev_y;
    }
    while x > 0 && y > 0 {
        ops.push(EditOp::Equal);
        x -= 1;
        y -= 1;
    }
    ops.reverse();
    ops
}
