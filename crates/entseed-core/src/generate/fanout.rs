/// Batch sizes of the halving fan-out schedule for `count` rows.
///
/// Each batch is half of the previous remainder, rounded up, and shares one
/// set of parent rows. The schedule stops after the remainder has reached 1,
/// so `10` yields `5, 3, 2, 1, 1`. A handful of parents end up owning most
/// of the children, and the batches always add up to at least `count`.
pub fn fan_out_batches(count: usize) -> Vec<usize> {
    let mut batches = Vec::new();
    if count == 0 {
        return batches;
    }

    let mut remaining = count;
    loop {
        let batch = remaining.div_ceil(2);
        batches.push(batch);
        if remaining == 1 {
            break;
        }
        remaining = batch;
    }
    batches
}
