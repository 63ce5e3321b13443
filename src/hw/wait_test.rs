use crate::hw::wait::{wait_for, Timeout};

#[test]
fn returns_number_of_polls() {
    let mut n = 0;
    let res = wait_for(|| { n += 1; n == 3 }, 10);
    assert_eq!(Ok(3), res);
}

#[test]
fn reports_exhaustion() {
    assert_eq!(Err(Timeout::Exhausted(5)), wait_for(|| false, 5));
}
