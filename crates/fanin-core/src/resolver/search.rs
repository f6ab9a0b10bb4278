//! Orden de exploración de combinaciones.
//!
//! Cada dimensión es un material de primer nivel y su índice es la posición
//! del candidato en la lista (0 = más reciente). Las combinaciones se
//! enumeran por "antigüedad" total ascendente (suma de índices); a igual
//! suma, en orden lexicográfico, es decir, los materiales declarados antes
//! se mantienen más nuevos primero.
//!
//! El iterador es explícito (sin recursión) y no materializa el espacio.

/// Tamaño del espacio de combinaciones (saturado).
pub fn search_space(lens: &[usize]) -> u128 {
    lens.iter().fold(1u128, |acc, &l| acc.saturating_mul(l as u128))
}

#[derive(Debug, Clone)]
pub struct StalenessOrder {
    bounds: Vec<usize>,
    level: usize,
    max_level: usize,
    current: Option<Vec<usize>>,
    done: bool,
}

impl StalenessOrder {
    /// `lens[i]` = cantidad de candidatos de la dimensión `i`.
    pub fn new(lens: &[usize]) -> Self {
        let done = lens.contains(&0);
        let bounds: Vec<usize> = lens.iter().map(|l| l.saturating_sub(1)).collect();
        let max_level = bounds.iter().sum();
        Self { bounds,
               level: 0,
               max_level,
               current: None,
               done }
    }

    fn next_level(&mut self) -> Option<Vec<usize>> {
        while self.level < self.max_level {
            self.level += 1;
            if let Some(v) = first_with_sum(&self.bounds, self.level) {
                return Some(v);
            }
        }
        None
    }
}

impl Iterator for StalenessOrder {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        if self.done {
            return None;
        }
        let next = match self.current.take() {
            None => first_with_sum(&self.bounds, self.level),
            Some(cur) => advance(&cur, &self.bounds).or_else(|| self.next_level()),
        };
        match next {
            Some(v) => {
                self.current = Some(v.clone());
                Some(v)
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}

/// Menor vector (lexicográfico) con suma `sum`: la masa se empuja hacia las
/// últimas dimensiones.
fn first_with_sum(bounds: &[usize], sum: usize) -> Option<Vec<usize>> {
    let mut v = vec![0; bounds.len()];
    let mut rem = sum;
    for i in (0..bounds.len()).rev() {
        let take = bounds[i].min(rem);
        v[i] = take;
        rem -= take;
    }
    if rem == 0 {
        Some(v)
    } else {
        None
    }
}

/// Siguiente vector lexicográfico con la misma suma.
fn advance(cur: &[usize], bounds: &[usize]) -> Option<Vec<usize>> {
    let n = cur.len();
    let mut suffix = 0usize;
    for i in (0..n).rev() {
        if cur[i] < bounds[i] && suffix > 0 {
            let mut v = cur.to_vec();
            v[i] += 1;
            let mut rem = suffix - 1;
            for j in (i + 1..n).rev() {
                let take = bounds[j].min(rem);
                v[j] = take;
                rem -= take;
            }
            return Some(v);
        }
        suffix += cur[i];
    }
    None
}
