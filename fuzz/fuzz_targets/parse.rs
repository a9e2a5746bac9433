#![no_main]

use ledgerline::{parse, BigRational, Transaction};
use libfuzzer_sys::fuzz_target;
use num_traits::Zero;

fuzz_target!(|data: &[u8]| {
    // Either the parse fails as a whole, or everything it returns balances.
    if let Ok(txns) = parse(data) {
        let overall = txns
            .iter()
            .map(Transaction::total)
            .fold(BigRational::zero(), |acc, t| acc + t);
        assert!(overall.is_zero(), "bad balance");
        assert!(txns.iter().all(|t| t.postings.len() >= 2));
    }
});
