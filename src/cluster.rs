use tracing::debug;

use crate::error::QuizError;
use crate::model::{Module, QuestionCluster, QuizDocument};

pub const DEFAULT_QUESTIONS_PER_CLUSTER: usize = 5;
pub const DEFAULT_MIN_CLUSTER_SIZE: usize = 3;

#[derive(Debug, Clone, Copy)]
pub struct ClusterConfig {
    /// Divisor of the question count giving the first cluster count tried.
    pub questions_per_cluster: usize,
    pub min_cluster_size: usize,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            questions_per_cluster: DEFAULT_QUESTIONS_PER_CLUSTER,
            min_cluster_size: DEFAULT_MIN_CLUSTER_SIZE,
        }
    }
}

pub fn cluster_document(document: &mut QuizDocument, config: ClusterConfig) -> Result<(), QuizError> {
    for module in document.modules_mut() {
        module.clusters = cluster_module(module, config)?;
    }
    Ok(())
}

/// Groups a module's questions by their minimum remediation slide.
///
/// Starts from `questions / questions_per_cluster` clusters and lowers the
/// count until every cluster holds at least `min_cluster_size` questions.
pub fn cluster_module(
    module: &Module,
    config: ClusterConfig,
) -> Result<Vec<QuestionCluster>, QuizError> {
    let ordered = module.ordered_questions();
    let values = ordered
        .iter()
        .map(|question| f64::from(question.min_slide().unwrap_or(0)))
        .collect::<Vec<f64>>();

    let mut target = (values.len() / config.questions_per_cluster.max(1)).max(1);
    loop {
        let partition = ward_partition(&values, target);
        let smallest = partition.iter().map(Vec::len).min().unwrap_or(0);

        if smallest >= config.min_cluster_size {
            debug!(
                module = %module.location(),
                clusters = partition.len(),
                "accepted question clusters"
            );

            let mut clusters = partition
                .into_iter()
                .map(|positions| {
                    let members = positions
                        .iter()
                        .map(|&position| ordered[position].index)
                        .collect::<Vec<usize>>();
                    let min_slide = positions
                        .iter()
                        .filter_map(|&position| ordered[position].min_slide())
                        .min()
                        .unwrap_or(0);
                    let max_slide = positions
                        .iter()
                        .filter_map(|&position| ordered[position].max_slide())
                        .max()
                        .unwrap_or(0);

                    QuestionCluster {
                        members,
                        min_slide,
                        max_slide,
                    }
                })
                .collect::<Vec<QuestionCluster>>();
            clusters.sort_by_key(|cluster| (cluster.min_slide, cluster.members.first().copied()));
            return Ok(clusters);
        }

        if target == 1 {
            return Err(QuizError::ClusteringInfeasible {
                location: module.location(),
                message: format!(
                    "{} questions cannot form clusters of at least {}",
                    values.len(),
                    config.min_cluster_size
                ),
            });
        }
        target -= 1;
    }
}

#[derive(Debug)]
struct Group {
    members: Vec<usize>,
    sum: f64,
}

impl Group {
    fn mean(&self) -> f64 {
        self.sum / self.members.len() as f64
    }
}

// Increase of the within-cluster sum of squares caused by merging `a` and `b`.
fn ward_cost(a: &Group, b: &Group) -> f64 {
    let size_a = a.members.len() as f64;
    let size_b = b.members.len() as f64;
    let gap = a.mean() - b.mean();
    size_a * size_b / (size_a + size_b) * gap * gap
}

/// Agglomerative Ward clustering of scalars down to `target` groups.
/// Returns positions into `values`, each group in ascending position order.
/// Equal costs resolve to the lowest (left, right) group pair.
fn ward_partition(values: &[f64], target: usize) -> Vec<Vec<usize>> {
    let mut groups = values
        .iter()
        .enumerate()
        .map(|(position, &value)| Group {
            members: vec![position],
            sum: value,
        })
        .collect::<Vec<Group>>();
    let target = target.clamp(1, values.len().max(1));

    while groups.len() > target {
        let mut best: Option<(f64, usize, usize)> = None;
        for left in 0..groups.len() {
            for right in (left + 1)..groups.len() {
                let cost = ward_cost(&groups[left], &groups[right]);
                if best.is_none_or(|(best_cost, _, _)| cost < best_cost) {
                    best = Some((cost, left, right));
                }
            }
        }

        let Some((_, left, right)) = best else {
            break;
        };
        let absorbed = groups.remove(right);
        groups[left].sum += absorbed.sum;
        groups[left].members.extend(absorbed.members);
    }

    groups
        .into_iter()
        .map(|mut group| {
            group.members.sort_unstable();
            group.members
        })
        .collect()
}
