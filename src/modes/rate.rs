// Refresh rate index resolution.
//
// The mode tables carry several refresh variants per resolution, selected by
// a small index (CR33). A requested refresh that falls between two variants
// maps to the lower one. A request far below or above every variant gets the
// default variant, which may be faster than asked.

/// (index, width, height, refresh)
const RATES: &[(u8, u16, u16, u16)] = &[
    (1, 320, 200, 60), (2, 320, 200, 70),
    (1, 320, 240, 60), (2, 320, 240, 75),
    (1, 400, 300, 60), (2, 400, 300, 75),
    (1, 512, 384, 60), (2, 512, 384, 75),
    (1, 640, 400, 70),
    (1, 640, 480, 60), (2, 640, 480, 72), (3, 640, 480, 75), (4, 640, 480, 85),
    (5, 640, 480, 100), (6, 640, 480, 120), (7, 640, 480, 160), (8, 640, 480, 200),
    (1, 720, 480, 60),
    (1, 720, 576, 58),
    (1, 768, 576, 58),
    (1, 800, 480, 60), (2, 800, 480, 75), (3, 800, 480, 85),
    (1, 800, 600, 56), (2, 800, 600, 60), (3, 800, 600, 72), (4, 800, 600, 75),
    (5, 800, 600, 85), (6, 800, 600, 105), (7, 800, 600, 120), (8, 800, 600, 160),
    (1, 848, 480, 39), (2, 848, 480, 60),
    (1, 856, 480, 39), (2, 856, 480, 60),
    (1, 1024, 576, 60), (2, 1024, 576, 75), (3, 1024, 576, 85),
    (1, 1024, 600, 60),
    (1, 1024, 768, 43), (2, 1024, 768, 60), (3, 1024, 768, 70), (4, 1024, 768, 75),
    (5, 1024, 768, 85), (6, 1024, 768, 100), (7, 1024, 768, 120),
    (1, 1152, 864, 75),
    (1, 1280, 720, 60), (2, 1280, 720, 75), (3, 1280, 720, 85),
    (1, 1280, 768, 60),
    (1, 1280, 960, 60), (2, 1280, 960, 85),
    (1, 1280, 1024, 43), (2, 1280, 1024, 60), (3, 1280, 1024, 75), (4, 1280, 1024, 85),
    (1, 1360, 768, 60),
    (1, 1400, 1050, 60), (2, 1400, 1050, 75),
    (1, 1600, 1200, 60), (2, 1600, 1200, 65), (3, 1600, 1200, 70), (4, 1600, 1200, 75),
    (5, 1600, 1200, 85), (6, 1600, 1200, 100), (7, 1600, 1200, 120),
    (1, 1920, 1440, 60), (2, 1920, 1440, 65), (3, 1920, 1440, 70), (4, 1920, 1440, 75),
    (5, 1920, 1440, 85), (6, 1920, 1440, 100),
    (1, 2048, 1536, 60), (2, 2048, 1536, 65), (3, 2048, 1536, 70), (4, 2048, 1536, 75),
    (5, 2048, 1536, 85),
];

/// a variant up to this many Hz above the request is taken as is
const ROUND_UP_TOLERANCE: u16 = 3;
/// a variant up to this many Hz below the request is taken as is
const ROUND_DOWN_TOLERANCE: u16 = 2;

/// Resolves the rate index of a resolution and refresh. Unknown
/// combinations get the 60 Hz variant of the resolution, or 1.
pub fn rate_index(width: u16, height: u16, refresh_hz: f32) -> u8 {
    let wanted = (refresh_hz + 0.5) as u16;
    let variants: Vec<(u8, u16)> = RATES
        .iter()
        .filter(|(_, w, h, _)| *w == width && *h == height)
        .map(|(idx, _, _, r)| (*idx, *r))
        .collect();

    let mut prev: Option<u8> = None;
    for &(idx, rate) in &variants {
        if rate == wanted {
            return idx;
        }
        if rate > wanted {
            if rate - wanted <= ROUND_UP_TOLERANCE {
                return idx;
            }
            if let Some(lower) = prev {
                return lower;
            }
            break;
        }
        if wanted - rate <= ROUND_DOWN_TOLERANCE {
            return idx;
        }
        prev = Some(idx);
    }

    variants
        .iter()
        .find(|(_, rate)| *rate == 60)
        .map_or(1, |(idx, _)| *idx)
}

/// refresh of a rate index, the inverse lookup used in the logs
pub fn rate_refresh(width: u16, height: u16, index: u8) -> Option<u16> {
    RATES
        .iter()
        .find(|(idx, w, h, _)| *idx == index && *w == width && *h == height)
        .map(|(_, _, _, r)| *r)
}
