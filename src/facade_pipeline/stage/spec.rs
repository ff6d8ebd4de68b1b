//! Fixed instruction payloads for the three external stages.

use std::fmt;

use serde::Serialize;

/// Identity of an externally backed stage, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageKind {
    /// Remove obstructions, keep the building photographic.
    Clean,
    /// Dim everything except the target building.
    Select,
    /// Flat red/blue/black segmentation.
    Mask,
}

impl StageKind {
    pub const ALL: [StageKind; 3] = [StageKind::Clean, StageKind::Select, StageKind::Mask];

    pub fn name(&self) -> &'static str {
        match self {
            StageKind::Clean => "clean",
            StageKind::Select => "select",
            StageKind::Mask => "mask",
        }
    }

    /// 1-based position in the pipeline.
    pub fn ordinal(&self) -> u8 {
        match self {
            StageKind::Clean => 1,
            StageKind::Select => 2,
            StageKind::Mask => 3,
        }
    }

    pub fn spec(&self) -> &'static StageSpec {
        match self {
            StageKind::Clean => &CLEAN_SPEC,
            StageKind::Select => &SELECT_SPEC,
            StageKind::Mask => &MASK_SPEC,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Versioned natural-language directive for one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageSpec {
    pub kind: StageKind,
    pub version: u32,
    pub instruction: &'static str,
}

pub static CLEAN_SPEC: StageSpec = StageSpec {
    kind: StageKind::Clean,
    version: 2,
    instruction: "You are an architectural photo editor. Take this street photograph and produce a clean, \
front-facing view of the main building facade.

Remove ALL obstructions in front of the building:
- Remove trees, bushes and other vegetation covering the facade
- Remove cars and other vehicles
- Remove pedestrians, street furniture and signs
- Remove stitching artefacts such as black triangular borders

Keep the building's visible geometry exactly as it is: the same window grid, balconies, floors and roof line. \
Where parts are hidden, infer them from the building's repeating architectural pattern. \
Correct the perspective as far as possible so the facade appears straight-on.

Keep the result photorealistic. Keep the exact same image dimensions as the input.",
};

pub static SELECT_SPEC: StageSpec = StageSpec {
    kind: StageKind::Select,
    version: 2,
    instruction: "Darken everything in this image EXCEPT the main building in the CENTER.

- Make neighbouring buildings very dark/dimmed
- Make the sky very dark
- Make the ground very dark

The center building must remain at full brightness, completely untouched: keep all its details, balconies \
and windows exactly as they are. Only dim everything around it so it stands out. \
Keep the exact same image dimensions as the input.",
};

pub static MASK_SPEC: StageSpec = StageSpec {
    kind: StageKind::Mask,
    version: 3,
    instruction: "The bright building in this image is the one to analyze. Ignore the darkened areas.

Create a segmentation mask for energy efficiency analysis:
- WINDOWS and glass doors -> SOLID RED (#FF0000)
- OPAQUE WALL (brick, concrete, plaster) -> SOLID BLUE (#0000FF)
- EVERYTHING ELSE -> SOLID BLACK (#000000)

About balconies: balcony floor slabs can cover the upper part of the windows on the floor below. \
Those windows still extend upward behind the slab. Mark each window as its full rectangle in red, \
including the part hidden behind the slab. The balcony slab itself is BLACK, not blue, because it is \
not part of the vertical facade wall.

Output a flat color mask only: solid red, blue and black, no gradients, no textures, no shading. \
Keep the exact same image dimensions as the input.",
};
