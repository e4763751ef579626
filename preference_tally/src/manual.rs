/*!

This is the long-form manual for `preference_tally` and `preftally`.

## Ballots

A ballot ranks some of the options of a poll. Each ranking entry gives an
option and a positive rank; a smaller rank is a stronger preference.

- Several options may share a rank: the voter is indifferent between them.
- Gaps in the ranks are ignored. `1, 3, 7` reads the same as `1, 2, 3`.
- Options left out are unranked. Every ranked option is preferred to every
  unranked one, and two unranked options are tied.

A ballot is rejected if it ranks nothing, ranks an option twice, uses a rank
below 1, names an option outside the poll or carries a count of zero.

A ballot record either stands for a single voter or is an aggregated record
with a count. Test ballots are ignored unless the rules ask for them. An
ignored test ballot is not validated either.

The total weight of the counted ballots may not go over `i64::MAX` votes
(`MAX_TOTAL_WEIGHT`). A larger poll fails with `WeightOverflow`.

## Candidates

By default the candidates are the options that appear on at least one
counted ballot. With the `allOptions` candidate scope, every option of the
poll is a candidate, including options nobody ranked.

## The rules

All the rules work on the pairwise margins: for two candidates A and B,
the margin of A over B is the number of voters who prefer A to B minus the
number who prefer B to A. Voters indifferent between A and B do not count.

- __Condorcet__: the candidate with a positive margin against every other
  candidate.
- __Weak Condorcet__: the candidates with a non-negative margin against every
  other candidate. A Condorcet winner is always a weak Condorcet winner.
- __Copeland__: one point for each pairwise win, minus one for each loss.
- __Minimax__: minus the largest defeat of the candidate, or 0 if it loses to
  no one.
- __Copeland-Global-Minimax__: the Copeland winners, then the best Minimax
  scores among them.

## Picking a winner

The rules are tried in this order:

1. If there is a Condorcet winner, it wins (`condorcet`).
2. If there is exactly one weak Condorcet winner, it wins (`weak_condorcet`).
3. If there is exactly one Copeland winner, it wins (`copeland`).
4. The Copeland winners are narrowed down with Minimax. If one candidate is
   left, it wins (`minimax`). Otherwise the remaining candidates are tied
   (`tie_minimax`).

A poll without candidates or without counted votes has no winner (`none`).

The result never depends on the order in which the ballots or the options
are given.

## Input formats

The `preftally` program reads the following formats:

* `csv` one column per rank
* `csv_likert` one column per option
* `json` a list of stored ballot records

### `csv`

Each line is a ballot. The cell in the n-th vote column holds the option(s)
ranked n-th. Options sharing a rank are separated by the tie delimiter
(`~` by default). Empty cells are skipped.

| id | count | choice 1      | choice 2 | choice 3 |
|----|-------|---------------|----------|----------|
| v1 | 6     | Pizza         | Sushi    | Tacos    |
| v2 | 1     | Pizza ~ Sushi |          | Tacos    |

Options may be written with their identifier or their name.

### `csv_likert`

The line before the first vote holds the option labels. Each cell of a vote
holds the rank given to the option of its column, or nothing.

| A | B | C |
|---|---|---|
| 1 | 2 | 3 |
| 2 | 1 |   |

### `json`

A list of ballots:

```json
[
  {
    "id": "r1",
    "rankings": [{"option_id": "x", "rank": 1}, {"option_id": "y", "rank": 2}],
    "count": 3,
    "is_test": false
  }
]
```

`id` and `count` are optional, the count defaults to 1. `is_test` defaults to false.

## Configuration

The configuration is a JSON file:

```json
{
  "outputSettings": {"pollId": "lunch", "title": "Team lunch", "outputPath": "out.json"},
  "options": [{"id": "pizza", "name": "Pizza"}, {"name": "Sushi"}],
  "ballotSources": [
    {
      "provider": "csv",
      "filePath": "lunch.csv",
      "idColumnIndex": 1,
      "countColumnIndex": 2,
      "testColumnIndex": 3,
      "firstVoteColumnIndex": 4,
      "firstVoteRowIndex": 2,
      "tieDelimiter": "~"
    }
  ],
  "rules": {"includeTest": false, "candidateScope": "ranked"}
}
```

- An option without `id` is identified by its name.
- File paths are relative to the configuration file.
- Column indices start at 1 and may be given as numbers, numeric strings or
  column letters (`"A"`). The votes start by default just after the id,
  count and test columns.
- Row indices start at 1. The votes start on the second line by default.
- An empty count cell stands for a count of 1. A test cell marks a test
  ballot when it holds `1`, `true`, `yes`, `y`, `x` or `test`.
- `candidateScope` is `ranked` (the default) or `allOptions`.

Without a configuration, the ballots are read from `--input` and the options
are taken from `--options` or from the labels found on the ballots.

## Output

The program writes a JSON report with four sections:

- `config`: the poll identifier and title
- `ballot_summary`: vote totals and record counts
- `import`: how many ballots were accepted and rejected, with a message
  listing the first rejected ones. Test ballots that are not counted are
  left out of the import.
- `results`: the detailed results: ballot types, pairwise matrices,
  candidate records, the outcome of each rule and the head-to-head
  breakdown of each pair

Percentages and averages are rounded to two decimals. When a reference file
is given with `--reference`, the report is compared to it and any difference
is printed as a diff.

*/
