//! Drops addresses the registry already reports as registered.
//!
//! Queries run one at a time in input order. A failed query aborts the
//! whole filter: an unknown state must never be treated as unregistered.

use alloy_primitives::Address;

use crate::error::RegistrationError;
use crate::registry::RegistrationQuery;

/// Return the addresses for which `is_registered` is currently `false`,
/// preserving input order.
///
/// `on_checked(index, total, address, registered)` is called after every
/// query and has no effect on the result.
pub async fn filter_unprocessed<Q, F>(
    query: &Q,
    addresses: &[Address],
    mut on_checked: F,
) -> Result<Vec<Address>, RegistrationError>
where
    Q: RegistrationQuery + ?Sized,
    F: FnMut(usize, usize, Address, bool),
{
    let total = addresses.len();
    let mut unregistered = Vec::with_capacity(total);

    for (index, &address) in addresses.iter().enumerate() {
        let registered = query.is_registered(address).await.map_err(|source| {
            RegistrationError::QueryFailed {
                address,
                checked: index,
                total,
                source,
            }
        })?;

        tracing::debug!(index, total, %address, registered, "checked registration status");
        on_checked(index, total, address, registered);

        if !registered {
            unregistered.push(address);
        }
    }

    tracing::info!(
        total,
        unregistered = unregistered.len(),
        "filtered already registered addresses"
    );
    Ok(unregistered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegistryError;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;

    struct SetQuery {
        registered: HashSet<Address>,
        fail_on: Option<Address>,
        seen: Mutex<Vec<Address>>,
    }

    #[async_trait]
    impl RegistrationQuery for SetQuery {
        async fn is_registered(&self, address: Address) -> Result<bool, RegistryError> {
            self.seen.lock().unwrap().push(address);
            if self.fail_on == Some(address) {
                return Err(RegistryError::Timeout { ms: 30_000 });
            }
            Ok(self.registered.contains(&address))
        }
    }

    fn addr(i: u8) -> Address {
        Address::with_last_byte(i)
    }

    fn query(registered: &[u8], fail_on: Option<u8>) -> SetQuery {
        SetQuery {
            registered: registered.iter().copied().map(addr).collect(),
            fail_on: fail_on.map(addr),
            seen: Mutex::new(Vec::new()),
        }
    }

    #[tokio::test]
    async fn removes_registered_and_keeps_order() {
        let q = query(&[2, 4], None);
        let input: Vec<_> = (1..=5).map(addr).collect();
        let out = filter_unprocessed(&q, &input, |_, _, _, _| {}).await.unwrap();
        assert_eq!(out, vec![addr(1), addr(3), addr(5)]);
        assert_eq!(*q.seen.lock().unwrap(), input);
    }

    #[tokio::test]
    async fn nothing_registered_returns_input() {
        let q = query(&[], None);
        let input: Vec<_> = (1..=4).map(addr).collect();
        let out = filter_unprocessed(&q, &input, |_, _, _, _| {}).await.unwrap();
        assert_eq!(out, input);
    }

    #[tokio::test]
    async fn reports_every_check() {
        let q = query(&[1], None);
        let input: Vec<_> = (1..=3).map(addr).collect();
        let mut checks = Vec::new();
        filter_unprocessed(&q, &input, |i, total, a, r| checks.push((i, total, a, r)))
            .await
            .unwrap();
        assert_eq!(
            checks,
            vec![(0, 3, addr(1), true), (1, 3, addr(2), false), (2, 3, addr(3), false)]
        );
    }

    #[tokio::test]
    async fn query_failure_aborts() {
        let q = query(&[], Some(3));
        let input: Vec<_> = (1..=5).map(addr).collect();
        let err = filter_unprocessed(&q, &input, |_, _, _, _| {}).await.unwrap_err();
        match err {
            RegistrationError::QueryFailed { address, checked, total, .. } => {
                assert_eq!(address, addr(3));
                assert_eq!(checked, 2);
                assert_eq!(total, 5);
            }
            other => panic!("expected QueryFailed, got {other:?}"),
        }
        // no queries after the failing one
        assert_eq!(q.seen.lock().unwrap().len(), 3);
    }
}
