//! Box-filter reduction of a supersampled bitmap

use super::GrayBmp;

/// Shrink `src` by `factor` into `dst`: every destination pixel becomes the
/// truncated mean of its `factor x factor` source block.
///
/// # Panics
/// Panics if `factor` is zero or `src` is smaller than `dst` scaled by
/// `factor`.
#[track_caller]
pub fn downsample(src: &GrayBmp, dst: &mut GrayBmp, factor: u32) {
    assert!(factor > 0, "downsample factor must be non-zero");
    assert!(
        src.width() as u64 >= dst.width() as u64 * factor as u64
            && src.height() as u64 >= dst.height() as u64 * factor as u64,
        "source {}x{} too small to downsample by {} into {}x{}",
        src.width(),
        src.height(),
        factor,
        dst.width(),
        dst.height()
    );

    let n = factor as usize;
    let area = factor as u64 * factor as u64;
    let (width, stride) = (dst.width() as usize, dst.stride());
    let mut sums = vec![0u64; width];

    let mut s = dst.session();
    let out = s.buffer_mut();
    for (i, dest_row) in out.chunks_mut(stride).enumerate() {
        sums.fill(0);
        for k in 0..n {
            let src_row = src.row((i * n + k) as u32);
            for (sum, block) in sums.iter_mut().zip(src_row.chunks_exact(n)) {
                *sum += block.iter().map(|&p| p as u64).sum::<u64>();
            }
        }
        for (d, &sum) in dest_row[..width].iter_mut().zip(&sums) {
            *d = (sum / area) as u8;
        }
    }
    s.dirty_all();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_average_truncates() {
        let mut src = GrayBmp::new(4, 2);
        // Left block: 10, 11, 12, 12 -> 45 / 4 = 11
        src.set_pixel(0, 0, 10);
        src.set_pixel(1, 0, 11);
        src.set_pixel(0, 1, 12);
        src.set_pixel(1, 1, 12);
        // Right block: one white pixel -> 255 / 4 = 63
        src.set_pixel(3, 1, 255);
        let mut dst = GrayBmp::new(2, 1);
        downsample(&src, &mut dst, 2);
        assert_eq!(dst.row(0), &[11, 63]);
    }

    #[test]
    fn test_factor_one_is_copy() {
        let mut src = GrayBmp::with_stride(3, 3, 12);
        src.draw_line(0, 0, 2, 2, 77);
        let mut dst = GrayBmp::new(3, 3);
        downsample(&src, &mut dst, 1);
        for y in 0..3 {
            assert_eq!(dst.row(y), src.row(y));
        }
        assert!(dst.take_committed().is_some());
    }

    #[test]
    fn test_large_factor_average() {
        // 5000^2 white pixels overflow a 32-bit block sum
        let mut src = GrayBmp::new(5000, 5000);
        src.clear(255);
        let mut dst = GrayBmp::new(1, 1);
        downsample(&src, &mut dst, 5000);
        assert_eq!(dst.pixel(0, 0), 255);
    }

    #[test]
    #[should_panic(expected = "too small")]
    fn test_source_too_small() {
        let src = GrayBmp::new(7, 8);
        let mut dst = GrayBmp::new(2, 2);
        downsample(&src, &mut dst, 4);
    }
}
