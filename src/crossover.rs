use crate::random::{EvolutionEvent, Happens};

/// Uniform crossover of two equally sized parameter vectors into two children. Each gene
/// is swapped between the children with the [EvolutionEvent::SwapGene] probability, and
/// otherwise stays with its own parent's child.
pub fn crossover(l: &[f64], r: &[f64], rng: &mut impl Happens) -> (Vec<f64>, Vec<f64>) {
    debug_assert_eq!(l.len(), r.len(), "crossover of mismatched genotypes");

    let mut l_child = Vec::with_capacity(l.len());
    let mut r_child = Vec::with_capacity(r.len());
    for (l_gene, r_gene) in l.iter().zip(r.iter()) {
        if rng.happens(EvolutionEvent::SwapGene) {
            l_child.push(*r_gene);
            r_child.push(*l_gene);
        } else {
            l_child.push(*l_gene);
            r_child.push(*r_gene);
        }
    }
    (l_child, r_child)
}
