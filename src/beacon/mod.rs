/*! Beacon dump parsing

URLTeam dumps are text files in a beacon-like format: a header block of `#KEY: value` lines
followed by one `|`-separated mapping per line.

```text
#FORMAT: BEACON
#PREFIX: https://goo.gl/
#TARGET:
abc123|https://example.com/some/page
```

[BeaconMetadata] holds the header, [BeaconLine] one parsed mapping.
!*/
mod line;
mod metadata;

pub use line::BeaconLine;
pub use metadata::BeaconMetadata;
