use log::{debug, info};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use snafu::{ensure, OptionExt, ResultExt};

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::apportion::Apportionment;
use crate::config::*;
use crate::generator::crossover::{check_crossover_rates, order_slate};
use crate::generator::{ballot_pool_to_profile, BallotGenerator, BallotSpace, BlocIntervals};
use crate::interval::{check_slates, derive_pref_intervals, slate_candidates};
use crate::profile::PreferenceProfile;
use crate::sampling::categorical;

/// The table as stored on disk: leading slate -> "W,C,W" -> frequency.
type RawBallotTypes = BTreeMap<String, BTreeMap<String, f64>>;

/// Observed frequencies of ballot types, a ballot type being the sequence of
/// the slates of the candidates on a ballot (`W,C,W` reads "a W candidate,
/// then a C candidate, then a W candidate").
///
/// The types are grouped by the slate they start with.
#[derive(Debug, Clone, PartialEq)]
pub struct BallotTypeTable {
    partitions: BTreeMap<String, Vec<(Vec<String>, f64)>>,
}

impl BallotTypeTable {
    /// Reads a JSON table. Labels found in `label_map` are renamed to the
    /// corresponding slate.
    pub fn from_path(
        path: &Path,
        label_map: Option<&BTreeMap<String, String>>,
    ) -> GenResult<BallotTypeTable> {
        let display = path.display().to_string();
        info!("Reading ballot types from {}", display);
        let contents = std::fs::read_to_string(path).context(ReadingBallotTypesSnafu {
            path: display.clone(),
        })?;
        let raw: RawBallotTypes =
            serde_json::from_str(&contents).context(ParsingBallotTypesSnafu { path: display })?;
        BallotTypeTable::from_entries(&raw, label_map)
    }

    pub fn from_entries(
        raw: &RawBallotTypes,
        label_map: Option<&BTreeMap<String, String>>,
    ) -> GenResult<BallotTypeTable> {
        let relabel = |label: &str| -> String {
            label_map
                .and_then(|m| m.get(label))
                .cloned()
                .unwrap_or_else(|| label.to_string())
        };
        let mut partitions: BTreeMap<String, Vec<(Vec<String>, f64)>> = BTreeMap::new();
        for (lead, types) in raw.iter() {
            let lead = relabel(lead.trim());
            let entries = partitions.entry(lead.clone()).or_default();
            for (ballot_type, freq) in types.iter() {
                let labels: Vec<String> = ballot_type
                    .split(',')
                    .map(|l| relabel(l.trim()))
                    .collect();
                ensure!(
                    labels.iter().all(|l| !l.is_empty()),
                    MalformedBallotTypesSnafu {
                        message: format!("empty slate label in ballot type {:?}", ballot_type)
                    }
                );
                ensure!(
                    labels[0] == lead,
                    MalformedBallotTypesSnafu {
                        message: format!(
                            "ballot type {:?} is filed under {} but starts with {}",
                            ballot_type, lead, labels[0]
                        )
                    }
                );
                ensure!(
                    freq.is_finite() && *freq >= 0.0,
                    MalformedBallotTypesSnafu {
                        message: format!("ballot type {:?} has frequency {}", ballot_type, freq)
                    }
                );
                match entries.iter_mut().find(|(l, _)| *l == labels) {
                    Some((_, f)) => *f += freq,
                    None => entries.push((labels, *freq)),
                }
            }
        }
        Ok(BallotTypeTable { partitions })
    }

    /// The ballot types starting with `slate`, with their frequencies.
    pub fn partition(&self, slate: &str) -> &[(Vec<String>, f64)] {
        self.partitions
            .get(slate)
            .map(|p| p.as_slice())
            .unwrap_or(&[])
    }

    fn check_against(&self, slate_to_candidates: &SlateToCandidates) -> GenResult<()> {
        ensure!(
            self.partitions.values().any(|p| !p.is_empty()),
            MalformedBallotTypesSnafu {
                message: "the table has no ballot type"
            }
        );
        for (lead, types) in self.partitions.iter() {
            for (labels, _) in types.iter() {
                if let Some(l) = labels.iter().find(|l| !slate_to_candidates.contains_key(*l)) {
                    return MalformedBallotTypesSnafu {
                        message: format!("label {} of partition {} is not a slate", l, lead),
                    }
                    .fail();
                }
            }
        }
        for slate in slate_to_candidates.keys() {
            let mass: f64 = self.partition(slate).iter().map(|(_, f)| *f).sum();
            ensure!(
                mass > 0.0,
                MalformedBallotTypesSnafu {
                    message: format!("no ballot type starts with slate {}", slate)
                }
            );
        }
        Ok(())
    }
}

/// The Cambridge sampler: the structure of a ballot (which slate comes at
/// which position) is drawn from observed ballot types, then the positions
/// are filled with Plackett-Luce orderings of each slate.
#[derive(Debug, Clone)]
pub struct CambridgeSampler {
    space: BallotSpace,
    blocs: BlocIntervals,
    slate_to_candidates: SlateToCandidates,
    bloc_crossover_rate: CrossoverRates,
    apportionment: Apportionment,
    ballot_types: BallotTypeTable,
    type_dists: HashMap<String, WeightedIndex<f64>>,
}

impl CambridgeSampler {
    pub fn new(
        candidates: &[String],
        ballot_length: Option<usize>,
        slate_to_candidates: &SlateToCandidates,
        pref_interval_by_bloc: &PrefIntervalByBloc,
        bloc_voter_prop: &BlocVoterProp,
        bloc_crossover_rate: &CrossoverRates,
        ballot_types: BallotTypeTable,
    ) -> GenResult<CambridgeSampler> {
        let space = BallotSpace::new(candidates, ballot_length)?;
        let blocs = BlocIntervals::new(candidates, pref_interval_by_bloc, bloc_voter_prop)?;
        check_slates(slate_to_candidates, candidates, bloc_voter_prop)?;
        check_crossover_rates(bloc_crossover_rate, bloc_voter_prop)?;
        ballot_types.check_against(slate_to_candidates)?;
        let mut type_dists: HashMap<String, WeightedIndex<f64>> = HashMap::new();
        for slate in slate_to_candidates.keys() {
            let freqs: Vec<f64> = ballot_types.partition(slate).iter().map(|(_, f)| *f).collect();
            type_dists.insert(slate.clone(), categorical(&freqs)?);
        }
        info!(
            "CambridgeSampler: {} slates, {} ballot types",
            slate_to_candidates.len(),
            ballot_types.partitions.values().map(|p| p.len()).sum::<usize>()
        );
        Ok(CambridgeSampler {
            space,
            blocs,
            slate_to_candidates: slate_to_candidates.clone(),
            bloc_crossover_rate: bloc_crossover_rate.clone(),
            apportionment: Apportionment::default(),
            ballot_types,
            type_dists,
        })
    }

    pub fn from_params<R: Rng + ?Sized>(
        params: &BlocParams,
        bloc_crossover_rate: &CrossoverRates,
        ballot_types: BallotTypeTable,
        ballot_length: Option<usize>,
        rng: &mut R,
    ) -> GenResult<CambridgeSampler> {
        let intervals = derive_pref_intervals(params, rng)?;
        CambridgeSampler::new(
            &slate_candidates(&params.slate_to_candidates),
            ballot_length,
            &params.slate_to_candidates,
            &intervals,
            &params.bloc_voter_prop,
            bloc_crossover_rate,
            ballot_types,
        )
    }

    pub fn with_apportionment(self, apportionment: Apportionment) -> CambridgeSampler {
        CambridgeSampler {
            apportionment,
            ..self
        }
    }

    pub fn pref_interval_by_bloc(&self) -> &PrefIntervalByBloc {
        self.blocs.pref_interval_by_bloc()
    }

    /// The slate a voter of `bloc` ranks first.
    fn leading_slate<'a, R: Rng + ?Sized>(&'a self, bloc: &'a str, rng: &mut R) -> &'a str {
        let draw: f64 = rng.gen();
        let mut acc = 0.0;
        if let Some(rates) = self.bloc_crossover_rate.get(bloc) {
            for (other, rate) in rates.iter() {
                acc += rate;
                if draw < acc {
                    return other;
                }
            }
        }
        bloc
    }

    fn ballot<R: Rng + ?Sized>(&self, bloc: &str, rng: &mut R) -> GenResult<Vec<String>> {
        let lead = self.leading_slate(bloc, rng);
        let partition = self.ballot_types.partition(lead);
        let dist = self.type_dists.get(lead).context(SamplingSnafu {
            message: format!("no ballot type starts with slate {}", lead),
        })?;
        let (labels, _) = &partition[dist.sample(rng)];

        let mut orders: HashMap<&str, std::vec::IntoIter<String>> = HashMap::new();
        let mut res: Vec<String> = Vec::with_capacity(labels.len());
        for label in labels.iter() {
            if !orders.contains_key(label.as_str()) {
                let slate = self
                    .slate_to_candidates
                    .get(label)
                    .map(|s| s.as_slice())
                    .unwrap_or(&[]);
                orders.insert(label, order_slate(&self.blocs, bloc, slate, rng)?.into_iter());
            }
            // An exhausted slate leaves no candidate at this position.
            if let Some(c) = orders.get_mut(label.as_str()).and_then(|o| o.next()) {
                res.push(c);
            }
        }
        res.truncate(self.space.ballot_length());
        Ok(res)
    }
}

impl BallotGenerator for CambridgeSampler {
    fn generate_profile<R: Rng + ?Sized>(
        &self,
        number_of_ballots: u64,
        rng: &mut R,
    ) -> GenResult<PreferenceProfile> {
        let mut pool: Vec<Vec<String>> = Vec::new();
        for (bloc, count) in self.blocs.bloc_counts(number_of_ballots, &self.apportionment) {
            debug!("CambridgeSampler: bloc {} casts {} ballots", bloc, count);
            for _ in 0..count {
                pool.push(self.ballot(&bloc, rng)?);
            }
        }
        Ok(ballot_pool_to_profile(pool, self.space.candidates()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ballot::{weight_of, Ballot};
    use crate::distance::{linf_dist, lp_dist};
    use crate::generator::tests::{check_reproducible, names};
    use crate::interval::tests::map;
    use num_rational::BigRational;
    use num_traits::ToPrimitive;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::path::PathBuf;

    fn testdata(name: &str) -> PathBuf {
        [env!("CARGO_MANIFEST_DIR"), "testdata", name].iter().collect()
    }

    fn wc_params() -> BlocParams {
        BlocParams {
            slate_to_candidates: map(&[("W", names(&["W1", "W2", "W3"])), ("C", names(&["C1", "C2"]))]),
            bloc_voter_prop: map(&[("W", 0.7), ("C", 0.3)]),
            cohesion: map(&[("W", 0.8), ("C", 0.9)]),
            alphas: map(&[
                ("W", map(&[("W", 1.0), ("C", 1.0)])),
                ("C", map(&[("W", 1.0), ("C", 1.0)])),
            ]),
        }
    }

    fn wc_rates() -> CrossoverRates {
        map(&[("W", map(&[("C", 0.2)])), ("C", map(&[("W", 0.1)]))])
    }

    fn table(entries: &[(&str, &[(&str, f64)])]) -> RawBallotTypes {
        entries
            .iter()
            .map(|(lead, types)| (lead.to_string(), map(types)))
            .collect()
    }

    fn slate_of(c: &str) -> &str {
        &c[..1]
    }

    #[test]
    fn ballots_follow_their_type() {
        let raw = table(&[("W", &[("W,C,W", 1.0)]), ("C", &[("C,W", 1.0)])]);
        let types = BallotTypeTable::from_entries(&raw, None).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(31);
        let g = CambridgeSampler::from_params(&wc_params(), &wc_rates(), types, None, &mut rng)
            .unwrap();
        let p = check_reproducible(&g, 200);
        for b in p.ballots() {
            let structure: Vec<&str> = b.candidates().map(slate_of).collect();
            assert!(
                structure == vec!["W", "C", "W"] || structure == vec!["C", "W"],
                "{}",
                b
            );
        }
    }

    /// Adds every ballot that can follow `prefix` to `law`, with the
    /// probability of Plackett-Luce picks within each slate.
    fn fill(
        labels: &[&str],
        slates: &SlateToCandidates,
        interval: &PrefInterval,
        prefix: Vec<String>,
        prob: f64,
        law: &mut HashMap<Vec<String>, f64>,
    ) {
        match labels.split_first() {
            None => *law.entry(prefix).or_insert(0.0) += prob,
            Some((label, rest)) => {
                let left: Vec<&String> = slates[*label]
                    .iter()
                    .filter(|c| !prefix.contains(*c))
                    .collect();
                let support: f64 = left.iter().map(|c| interval[*c]).sum();
                for c in left.iter() {
                    let mut next = prefix.clone();
                    next.push((*c).clone());
                    fill(rest, slates, interval, next, prob * interval[*c] / support, law);
                }
            }
        }
    }

    /// The probability of every possible ballot.
    fn cambridge_law(
        g: &CambridgeSampler,
        params: &BlocParams,
        rates: &CrossoverRates,
        raw: &RawBallotTypes,
    ) -> HashMap<Vec<String>, f64> {
        let mut law: HashMap<Vec<String>, f64> = HashMap::new();
        for (bloc, prop) in params.bloc_voter_prop.iter() {
            let interval = &g.pref_interval_by_bloc()[bloc];
            let mut leads: Vec<(String, f64)> =
                rates.get(bloc).cloned().unwrap_or_default().into_iter().collect();
            let stay = 1.0 - leads.iter().map(|(_, r)| *r).sum::<f64>();
            leads.push((bloc.clone(), stay));
            for (lead, p_lead) in leads {
                let types = &raw[&lead];
                let total: f64 = types.values().sum();
                for (ballot_type, freq) in types.iter() {
                    let labels: Vec<&str> = ballot_type.split(',').collect();
                    let prob = prop * p_lead * freq / total;
                    fill(&labels, &params.slate_to_candidates, interval, vec![], prob, &mut law);
                }
            }
        }
        law
    }

    #[test]
    fn profile_follows_crossover_rates_and_type_frequencies() {
        let raw = table(&[
            ("W", &[("W", 1.0), ("W,C", 3.0)]),
            ("C", &[("C", 1.0), ("C,W", 1.0)]),
        ]);
        let rates = map(&[("W", map(&[("C", 0.3)]))]);
        let params = wc_params();
        let mut rng = ChaCha8Rng::seed_from_u64(35);
        let types = BallotTypeTable::from_entries(&raw, None).unwrap();
        let g = CambridgeSampler::from_params(&params, &rates, types, None, &mut rng).unwrap();
        let n: u64 = 30_000;
        let p = g.generate_profile(n, &mut rng).unwrap();
        assert_eq!(p.num_ballots(), weight_of(n));

        let mass = |keep: &dyn Fn(&[&str]) -> bool| -> f64 {
            p.ballots()
                .iter()
                .filter(|b| {
                    let structure: Vec<&str> = b.candidates().map(slate_of).collect();
                    keep(structure.as_slice())
                })
                .map(|b| b.weight.to_f64().unwrap_or(0.0))
                .sum::<f64>()
                / n as f64
        };

        // The C bloc (0.3) always leads with C, 30% of the W bloc (0.7) too.
        let c_led = mass(&|s| s[0] == "C");
        assert!((c_led - 0.3 - 0.3 * 0.7).abs() < 0.012, "{}", c_led);

        // Ballot types are drawn 1:3 after W and 1:1 after C.
        let w_led = mass(&|s| s[0] == "W");
        let w_alone = mass(&|s| s.len() == 1 && s[0] == "W");
        assert!((w_alone / w_led - 0.25).abs() < 0.02, "{}", w_alone / w_led);
        let c_alone = mass(&|s| s.len() == 1 && s[0] == "C");
        assert!((c_alone / c_led - 0.5).abs() < 0.02, "{}", c_alone / c_led);

        let law = cambridge_law(&g, &params, &rates, &raw);
        assert!((law.values().sum::<f64>() - 1.0).abs() < 1e-9);
        for b in p.ballots() {
            let ranking: Vec<String> = b.candidates().map(|c| c.to_string()).collect();
            assert!(law.get(&ranking).map_or(false, |x| *x > 0.0), "{}", b);
        }
        let theory = PreferenceProfile::new(
            law.iter()
                .map(|(r, prob)| {
                    Ballot::from_names(r).with_weight(BigRational::from_float(*prob).unwrap())
                })
                .collect(),
        );
        assert!(linf_dist(&p, &theory) < 0.015);
        assert!(lp_dist(&p, &theory, 1).unwrap() < 0.06);
    }

    #[test]
    fn exhausted_slates_are_skipped() {
        // Three C positions but only two C candidates.
        let raw = table(&[("W", &[("W,C,C,C,W", 1.0)]), ("C", &[("C,C,C", 1.0)])]);
        let types = BallotTypeTable::from_entries(&raw, None).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(32);
        let g = CambridgeSampler::from_params(
            &wc_params(),
            &CrossoverRates::new(),
            types,
            Some(4),
            &mut rng,
        )
        .unwrap();
        let p = g.generate_profile(50, &mut rng).unwrap();
        assert_eq!(p.num_ballots(), weight_of(50));
        for b in p.ballots() {
            let structure: Vec<&str> = b.candidates().map(slate_of).collect();
            assert!(
                structure == vec!["W", "C", "C", "W"] || structure == vec!["C", "C"],
                "{}",
                b
            );
        }
    }

    #[test]
    fn table_from_file_with_labels() {
        let label_map = map(&[("A", "W".to_string()), ("B", "C".to_string())]);
        let types =
            BallotTypeTable::from_path(&testdata("ballot_types.json"), Some(&label_map)).unwrap();
        assert!(!types.partition("W").is_empty());
        assert!(!types.partition("C").is_empty());
        assert!(types.partition("A").is_empty());
        let mut rng = ChaCha8Rng::seed_from_u64(33);
        let g = CambridgeSampler::from_params(&wc_params(), &wc_rates(), types, Some(3), &mut rng)
            .unwrap();
        let p = g.generate_profile(100, &mut rng).unwrap();
        assert_eq!(p.num_ballots(), weight_of(100));
    }

    #[test]
    fn unreadable_tables_are_data_errors() {
        let missing = BallotTypeTable::from_path(&testdata("no_such_table.json"), None);
        assert!(missing.unwrap_err().is_data_error());
        let garbled = BallotTypeTable::from_path(&testdata("ballot_types_garbled.json"), None);
        assert!(matches!(
            garbled.unwrap_err(),
            GeneratorError::ParsingBallotTypes { .. }
        ));
    }

    #[test]
    fn inconsistent_tables_are_data_errors() {
        let mut rng = ChaCha8Rng::seed_from_u64(34);
        let mut build = |raw: RawBallotTypes| -> GeneratorError {
            let types = match BallotTypeTable::from_entries(&raw, None) {
                Ok(t) => t,
                Err(e) => return e,
            };
            CambridgeSampler::from_params(&wc_params(), &wc_rates(), types, None, &mut rng)
                .unwrap_err()
        };
        // Wrong partition.
        let e = build(table(&[("W", &[("C,W", 1.0)]), ("C", &[("C", 1.0)])]));
        assert!(e.is_data_error());
        // Unknown label.
        let e = build(table(&[("W", &[("W,X", 1.0)]), ("C", &[("C", 1.0)])]));
        assert!(e.is_data_error());
        // Negative frequency.
        let e = build(table(&[("W", &[("W", -1.0)]), ("C", &[("C", 1.0)])]));
        assert!(e.is_data_error());
        // No ballot type for C.
        let e = build(table(&[("W", &[("W,C", 1.0)])]));
        assert!(e.is_data_error());
        // Empty table.
        let e = build(RawBallotTypes::new());
        assert!(e.is_data_error());
    }
}
