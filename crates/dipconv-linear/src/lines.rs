/// Geometry of the image lines along one axis of a row-major sample buffer.
///
/// Lines are numbered by walking the dimensions before the axis in the outer loop and the
/// dimensions after it (tensor elements included) in the inner loop. Buffers that differ only
/// in their size along the axis share the same numbering.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LineLayout {
    /// Samples per line.
    pub length: usize,
    /// Distance between consecutive samples of a line.
    pub stride: usize,
    /// Number of lines.
    pub count: usize,
    outer_step: usize,
}

impl LineLayout {
    pub fn new(sizes: &[usize], tensor_elements: usize, axis: usize) -> Self {
        let stride = sizes[axis + 1..].iter().product::<usize>() * tensor_elements;
        let length = sizes[axis];
        let outer = sizes[..axis].iter().product::<usize>();
        Self {
            length,
            stride,
            count: outer * stride,
            outer_step: length * stride,
        }
    }

    /// Offset of the first sample of `line`.
    #[inline]
    pub fn start(&self, line: usize) -> usize {
        (line / self.stride) * self.outer_step + line % self.stride
    }

    /// Copy `line` out of `data` into `out`, which holds `length` samples.
    pub fn gather<T: Copy>(&self, data: &[T], line: usize, out: &mut [T]) {
        let start = self.start(line);
        for (i, o) in out.iter_mut().enumerate() {
            *o = data[start + i * self.stride];
        }
    }

    /// Copy `src`, which holds `length` samples, into `line` of `data`.
    pub fn scatter<T: Copy>(&self, src: &[T], line: usize, data: &mut [T]) {
        let start = self.start(line);
        for (i, &s) in src.iter().enumerate() {
            data[start + i * self.stride] = s;
        }
    }

    /// Write a line-major buffer of `count * length` samples back into row-major order.
    pub fn scatter_all<T: Copy>(&self, lines: &[T], data: &mut [T]) {
        for (line, src) in lines.chunks(self.length).enumerate() {
            self.scatter(src, line, data);
        }
    }
}

/// Linear offset of a coordinate shifted by `shift` along every dimension.
pub(crate) fn offset_of(coords: &[usize], shift: &[usize], strides: &[usize]) -> usize {
    coords
        .iter()
        .zip(shift)
        .zip(strides)
        .map(|((&c, &s), &stride)| (c + s) * stride)
        .sum()
}
