use crate::libs::error::DivError;

pub fn gcd(a: usize, b: usize) -> usize {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

pub fn lcm(a: usize, b: usize) -> usize {
    a / gcd(a, b) * b
}

/// Chunks per alignment subset, `lcm(S, W) / S`, so that `S * C` jobs keep
/// all `W` workers busy in every scheduling round.
pub fn chunk_count(subsets: usize, workers: usize) -> Result<usize, DivError> {
    if subsets == 0 || workers == 0 {
        return Err(DivError::Configuration(format!(
            "Chunk planning needs at least one subset and one worker, got {} and {}",
            subsets, workers
        )));
    }
    Ok(lcm(subsets, workers) / subsets)
}

/// Splits `items` into `count` contiguous groups whose sizes differ by at most one.
/// Groups are empty when there are fewer items than groups.
pub fn divide<T: Clone>(items: &[T], count: usize) -> Vec<Vec<T>> {
    if count == 0 {
        return Vec::new();
    }
    let base = items.len() / count;
    let extra = items.len() % count;

    let mut groups = Vec::with_capacity(count);
    let mut start = 0;
    for i in 0..count {
        let len = base + usize::from(i < extra);
        groups.push(items[start..start + len].to_vec());
        start += len;
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_count() {
        assert_eq!(chunk_count(3, 4).unwrap(), 4);
        assert_eq!(chunk_count(3, 4).unwrap() * 3 % 4, 0);
        assert_eq!(chunk_count(4, 2).unwrap(), 1);
        assert_eq!(chunk_count(6, 4).unwrap(), 2);
        assert_eq!(chunk_count(1, 8).unwrap(), 8);
        assert!(chunk_count(0, 4).is_err());
        assert!(chunk_count(3, 0).is_err());
    }

    #[test]
    fn test_chunk_total_is_multiple_of_workers() {
        for s in 1..20 {
            for w in 1..17 {
                let c = chunk_count(s, w).unwrap();
                assert_eq!((s * c) % w, 0, "S={} W={}", s, w);
            }
        }
    }

    #[test]
    fn test_divide() {
        let items: Vec<usize> = (0..10).collect();
        let groups = divide(&items, 4);
        assert_eq!(
            groups.iter().map(|g| g.len()).collect::<Vec<_>>(),
            vec![3, 3, 2, 2]
        );
        assert_eq!(groups.concat(), items);

        let groups = divide(&items[..2], 4);
        assert_eq!(groups.len(), 4);
        assert!(groups[2].is_empty() && groups[3].is_empty());

        assert!(divide(&items, 0).is_empty());
    }
}
