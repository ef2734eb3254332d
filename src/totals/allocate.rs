/// Distributes `total` across items proportionally to `bases`. Each item gets
/// `floor(basis / sum * total)`, then the rounding remainder is handed out one
/// unit at a time to items in descending-basis order (stable, so ties keep
/// their original position). Postcondition: the allocations sum to `total`
/// exactly.
pub fn allocate_pro_rata(bases: &[i64], total: i64) -> Vec<i64> {
    let sum: i128 = bases.iter().map(|b| *b as i128).sum();
    if sum <= 0 || total <= 0 {
        return vec![0; bases.len()];
    }

    let mut shares: Vec<i64> = bases
        .iter()
        .map(|b| ((*b as i128 * total as i128) / sum) as i64)
        .collect();

    let mut remainder = total - shares.iter().sum::<i64>();
    let order = descending_basis_order(bases);
    let mut i = 0;
    while remainder > 0 {
        shares[order[i % order.len()]] += 1;
        remainder -= 1;
        i += 1;
    }

    shares
}

/// Adjusts `shares` by +/-1 per item, walking the descending-basis order,
/// until they sum to `expected`. Never drives a share below zero. Used to
/// force per-item rounded tax amounts to match the tax computed on the whole
/// taxable base.
pub fn reconcile(shares: &mut [i64], bases: &[i64], expected: i64) {
    let mut diff = expected - shares.iter().sum::<i64>();
    if diff == 0 || shares.is_empty() {
        return;
    }

    let order = descending_basis_order(bases);
    let mut i = 0;
    let mut moved = false;
    while diff != 0 {
        let idx = order[i % order.len()];
        if diff > 0 {
            shares[idx] += 1;
            diff -= 1;
            moved = true;
        } else if shares[idx] > 0 {
            shares[idx] -= 1;
            diff += 1;
            moved = true;
        }
        i += 1;
        // A negative target stalls once every share hits zero; stop instead
        // of walking the order forever.
        if i % order.len() == 0 {
            if !moved {
                return;
            }
            moved = false;
        }
    }
}

fn descending_basis_order(bases: &[i64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..bases.len()).collect();
    order.sort_by(|a, b| bases[*b].cmp(&bases[*a]));
    order
}
