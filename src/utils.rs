use crate::signal::SimObject;

pub async fn clock_cycles(signal: SimObject, n_cycles: u32) {
    for _ in 0..n_cycles {
        signal.rising_edge().await;
    }
}
