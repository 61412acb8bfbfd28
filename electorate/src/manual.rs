/*!

This is the long-form manual for `electorate` and `synthvote`.

## Models

The following generators are available. The name in parentheses is the value
of the `generator` key in a `synthvote` configuration file.

* Impartial Culture (`ic`)
* Impartial Anonymous Culture (`iac`)
* Ballot Simplex (`simplex`)
* Plackett-Luce (`plackett_luce`)
* Bradley-Terry (`bradley_terry`)
* Alternating Crossover (`alternating_crossover`)
* Cambridge Sampler (`cambridge`)
* One-dimensional spatial (`one_dim_spatial`)

All the generators accept a `ballot_length`: ballots rank that many
candidates (all of them if not specified).

### `ic`

Every ballot is drawn uniformly among all the possible ballots.

### `iac`

A distribution over the possible ballots is drawn uniformly (a Dirichlet draw
with concentration 1), then every ballot of the profile is drawn from it.

### `simplex`

Like `iac`, with a configurable concentration `alpha`. Small concentrations
produce profiles dominated by a few ballots. With `alpha = 0`, all the
ballots of a profile are identical.

The simplex can also be centered on a `point`: a preference vector over the
candidates. The ballots then follow the Plackett-Luce law of that vector.

### `plackett_luce`

Voters are split into blocs. Each bloc has a preference interval: a support
value for every candidate, summing to 1. A voter fills their ballot one
position at a time, picking among the remaining candidates with probabilities
proportional to their support.

### `bradley_terry`

Same blocs and intervals as `plackett_luce`. The probability of a ballot is
proportional to the product, over all the pairs of candidates on it, of
`s_i / (s_i + s_j)` with `i` ranked above `j`. Every possible ballot is
enumerated, so this model only suits small elections (up to about 9
candidates).

### `alternating_crossover`

Each bloc has a slate: the candidates it fields. Most voters rank their own
slate first, then the others. A fraction of them (the crossover rate) instead
alternate between the slate of another bloc and their own, starting with the
other bloc. Within a slate, candidates are ordered with Plackett-Luce.

### `cambridge`

The slates of the candidates on a ballot follow observed ballot types, read
from a JSON table. The leading slate of a ballot is the voter's own slate, or
another bloc's slate with the crossover rate. Positions are filled with
Plackett-Luce orderings of the slates; when a slate has no candidate left,
its position is skipped.

The table is keyed by the leading slate, then by the ballot type, with the
observed frequency as the value:

```text
{
  "W": { "W": 212.0, "W,W,C": 45.0, "W,C,W": 19.0 },
  "C": { "C": 74.0, "C,W": 22.0 }
}
```

Tables recorded with other slate names can be used with a label map (for
example `{"A": "W", "B": "C"}`).

### `one_dim_spatial`

Candidates and voters are placed on a line with standard normal positions.
Voters rank candidates from the closest to the farthest.

## Blocs from cohesion parameters

Instead of giving the preference intervals directly, the bloc models can
derive them from:

- `slateToCandidates`: the candidates of each bloc's slate,
- `cohesion`: the share of support a bloc gives to its own slate,
- `alphas`: for each bloc and each slate, a Dirichlet concentration. It sets
  how the remaining support is split between the other slates, and how
  evenly support is spread within a slate.

## Bloc sizes

The number of ballots of each bloc comes from `blocVoterProp`, whose values
must sum to 1. By default the counts are computed with the largest remainder
method and always sum to the requested number of ballots. The
`roundHalfUp` policy rounds every bloc on its own instead; the total may then
be off by a few ballots.

## Configuration

`synthvote` reads a JSON configuration:

```text
{
  "generator": "plackett_luce",
  "numberOfBallots": 1000,
  "seed": 7,
  "ballotLength": 3,
  "slateToCandidates": { "R": ["A1", "B1"], "D": ["A2", "B2"] },
  "blocVoterProp": { "R": 0.6, "D": 0.4 },
  "cohesion": { "R": 0.7, "D": 0.8 },
  "alphas": { "R": { "R": 1.0, "D": 1.0 }, "D": { "R": 1.0, "D": 1.0 } },
  "outputPath": "profile.csv"
}
```

Other keys: `candidates`, `prefIntervalByBloc`, `blocCrossoverRate`, `alpha`,
`point`, `ballotTypesPath` (relative to the configuration file), `labelMap`
and `apportionment` (`largestRemainder` or `roundHalfUp`).

## Profile files

Profiles are written as CSV: an `id` column, a `weight` column, then one
column per rank. An empty cell is an undervote and tied candidates are joined
with `=`.

```text
id,weight,rank 1,rank 2,rank 3
b1,12,A1,B1,A2
b2,3,B2,,
```

Profiles can also be read from BLT files:

```text
3 1
4 1 2 0
2 3 - 1 0
0
"Alice"
"Bob"
"Charlie"
"Title"
```

The first line holds the number of candidates and seats. Each ballot line
holds a weight, candidate numbers (starting at 1, `-` for an undervote) and
a closing 0. A lone 0 ends the ballots.
 */
