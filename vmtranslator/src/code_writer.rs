//! Lowers parsed VM commands to Hack assembly.
//!
//! Holds the translator's mutable state explicitly (current function,
//! return/label counters, static-segment addresses) rather than as process
//! globals, so a run is confined to one owned value and two independent
//! translations can coexist in the same process.

use common::AddressTable;
use phf::phf_map;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};

macro_rules! write_asm {
    ($writer:expr, $($line:literal)*) => {
        $writer.write_all(concat!($($line, "\n"),*).as_bytes())
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SegmentSymbol {
    Local,
    Argument,
    This,
    That,
    Temp,
    Pointer,
    Static,
    Constant,
}

/// Segment name -> kind, compile-time perfect hash (same idiom as the
/// assembler's dest/comp/jump tables).
static SEGMENT_MAP: phf::Map<&'static str, SegmentSymbol> = phf_map! {
    "local" => SegmentSymbol::Local,
    "argument" => SegmentSymbol::Argument,
    "this" => SegmentSymbol::This,
    "that" => SegmentSymbol::That,
    "temp" => SegmentSymbol::Temp,
    "pointer" => SegmentSymbol::Pointer,
    "static" => SegmentSymbol::Static,
    "constant" => SegmentSymbol::Constant,
};

impl SegmentSymbol {
    fn from_str(segment: &str) -> Option<Self> {
        SEGMENT_MAP.get(segment).copied()
    }

    /// Base-pointer symbol for the segments that address `RAM[base + index]`.
    fn base_pointer_symbol(self) -> &'static str {
        match self {
            SegmentSymbol::Local => "LCL",
            SegmentSymbol::Argument => "ARG",
            SegmentSymbol::This => "THIS",
            SegmentSymbol::That => "THAT",
            _ => unreachable!("only called for base+offset segments"),
        }
    }
}

/// Every way a VM command can fail to lower to assembly: either the command
/// itself names an unknown mnemonic/segment (§4.2's "wrong segment name
/// during VM translation" syntactic error), or the underlying write failed.
#[derive(Debug)]
pub enum CodeWriterError {
    UnknownArithmeticCommand(String),
    UnknownSegment(String),
    InvalidPointerIndex(i32),
    Io(std::io::Error),
}

impl fmt::Display for CodeWriterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownArithmeticCommand(cmd) => {
                write!(f, "unknown arithmetic command '{cmd}'")
            }
            Self::UnknownSegment(seg) => write!(f, "unknown segment '{seg}'"),
            Self::InvalidPointerIndex(i) => {
                write!(f, "pointer segment index must be 0 or 1, got {i}")
            }
            Self::Io(e) => write!(f, "write failed: {e}"),
        }
    }
}

impl std::error::Error for CodeWriterError {}

impl From<std::io::Error> for CodeWriterError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// First RAM address available for static-variable allocation.
const FIRST_STATIC_ADDRESS: u16 = 16;

pub struct CodeWriter {
    output_file: BufWriter<File>,
    /// Monotonic across the whole run; feeds anonymous comparison labels.
    label_counter: u32,
    /// Resets to 0 at every `function` command.
    return_counter: u32,
    /// Name of the currently-open function; prefixes `label`/`goto`/`if-goto`.
    current_function: String,
    /// Stem of the file currently being translated; namespaces `static i`.
    current_file_namespace: String,
    /// `<namespace>.<index>` -> RAM address, shared across the whole run so
    /// distinct source files never collide.
    statics: AddressTable<Box<dyn FnMut() -> u16>>,
}

impl CodeWriter {
    /// Creates a new `CodeWriter`, writing assembly to `output_filename`.
    pub fn new(output_filename: &str) -> Result<Self, std::io::Error> {
        let file = File::create(output_filename)?;
        let buffered = BufWriter::with_capacity(8192, file);
        let mut next_static = FIRST_STATIC_ADDRESS;
        let allocate: Box<dyn FnMut() -> u16> = Box::new(move || {
            let addr = next_static;
            next_static += 1;
            addr
        });
        Ok(CodeWriter {
            output_file: buffered,
            label_counter: 0,
            return_counter: 0,
            current_function: "Main".to_string(),
            current_file_namespace: String::new(),
            statics: AddressTable::new(allocate),
        })
    }

    /// Sets the namespace used for `static i` resolution. Called once per
    /// input file in a multi-file translation.
    #[inline]
    pub fn set_filename(&mut self, filename: &str) {
        let name = std::path::Path::new(filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Unknown");
        self.current_file_namespace.clear();
        self.current_file_namespace.push_str(name);
    }

    /// Emits the bootstrap prelude: `SP = 256` then `call Sys.init 0`.
    pub fn write_bootstrap(&mut self) -> Result<(), CodeWriterError> {
        writeln!(self.output_file, "// bootstrap")?;
        write_asm!(self.output_file,
            "@256"
            "D=A"
            "@SP"
            "M=D"
        )?;
        self.write_call("Sys.init", 0)?;
        self.output_file.write_all(b"\n")?;
        Ok(())
    }

    /// Emits the epilogue: an endless loop at `INFINITE_LOOP`.
    pub fn write_epilogue(&mut self) -> Result<(), CodeWriterError> {
        writeln!(self.output_file, "(INFINITE_LOOP)")?;
        write_asm!(self.output_file,
            "@INFINITE_LOOP"
            "0;JMP"
        )?;
        Ok(())
    }

    pub fn write_arithmetic(&mut self, command: &str) -> Result<(), CodeWriterError> {
        writeln!(self.output_file, "// vm command:{command}")?;

        match command {
            "add" => self.write_binary_op("M=D+M"),
            "sub" => self.write_binary_op("M=M-D"),
            "and" => self.write_binary_op("M=D&M"),
            "or" => self.write_binary_op("M=D|M"),
            "neg" => self.write_unary_op("M=-M"),
            "not" => self.write_unary_op("M=!M"),
            "eq" => self.write_comparison("JEQ"),
            "gt" => self.write_comparison("JGT"),
            "lt" => self.write_comparison("JLT"),
            other => Err(CodeWriterError::UnknownArithmeticCommand(other.to_string())),
        }
    }

    /// Binary ops operate in place on the stack: pop `op2` into `D`,
    /// decrement `SP` so `M[SP]` addresses `op1`, then combine in place.
    #[inline]
    fn write_binary_op(&mut self, compute: &str) -> Result<(), CodeWriterError> {
        write_asm!(self.output_file,
            "@SP"
            "AM=M-1"
            "D=M"
            "A=A-1"
        )?;
        writeln!(self.output_file, "{compute}")?;
        Ok(())
    }

    /// Unary ops operate in place on the top of stack.
    #[inline]
    fn write_unary_op(&mut self, compute: &str) -> Result<(), CodeWriterError> {
        write_asm!(self.output_file,
            "@SP"
            "A=M-1"
        )?;
        writeln!(self.output_file, "{compute}")?;
        Ok(())
    }

    #[inline]
    fn write_comparison(&mut self, jump: &str) -> Result<(), CodeWriterError> {
        let label_num = self.label_counter;
        self.label_counter += 1;

        write_asm!(self.output_file,
            "@SP"
            "AM=M-1"
            "D=M"
            "A=A-1"
            "D=M-D"
        )?;
        writeln!(
            self.output_file,
            "@TRUE{label_num}\n\
             D;{jump}\n\
             @SP\n\
             A=M-1\n\
             M=0\n\
             @END{label_num}\n\
             0;JMP\n\
             (TRUE{label_num})\n\
             @SP\n\
             A=M-1\n\
             M=-1\n\
             (END{label_num})"
        )?;
        Ok(())
    }

    pub fn write_push_pop(
        &mut self,
        command: &str,
        segment: &str,
        index: i32,
    ) -> Result<(), CodeWriterError> {
        writeln!(self.output_file, "// vm command:{command} {segment} {index}")?;

        if command == "push" {
            self.write_push(segment, index)
        } else {
            self.write_pop(segment, index)
        }
    }

    fn write_push(&mut self, segment: &str, index: i32) -> Result<(), CodeWriterError> {
        match SegmentSymbol::from_str(segment) {
            Some(SegmentSymbol::Constant) => {
                write!(self.output_file, "@{index}\nD=A\n")?;
                self.write_push_d()
            }
            Some(
                seg @ (SegmentSymbol::Local
                | SegmentSymbol::Argument
                | SegmentSymbol::This
                | SegmentSymbol::That),
            ) => {
                write!(
                    self.output_file,
                    "@{}\nD=M\n@{index}\nA=D+A\nD=M\n",
                    seg.base_pointer_symbol()
                )?;
                self.write_push_d()
            }
            Some(SegmentSymbol::Temp) => {
                write!(self.output_file, "@{}\nD=M\n", 5 + index)?;
                self.write_push_d()
            }
            Some(SegmentSymbol::Pointer) => {
                let reg = pointer_register(index)?;
                write!(self.output_file, "@{reg}\nD=M\n")?;
                self.write_push_d()
            }
            Some(SegmentSymbol::Static) => {
                let address = self.static_address(index);
                write!(self.output_file, "@{address}\nD=M\n")?;
                self.write_push_d()
            }
            None => Err(CodeWriterError::UnknownSegment(segment.to_string())),
        }
    }

    fn write_pop(&mut self, segment: &str, index: i32) -> Result<(), CodeWriterError> {
        match SegmentSymbol::from_str(segment) {
            Some(
                seg @ (SegmentSymbol::Local
                | SegmentSymbol::Argument
                | SegmentSymbol::This
                | SegmentSymbol::That),
            ) => {
                write!(
                    self.output_file,
                    "@{}\nD=M\n@{index}\nD=D+A\n@R13\nM=D\n",
                    seg.base_pointer_symbol()
                )?;
                self.write_pop_to_d()?;
                write_asm!(self.output_file,
                    "@R13"
                    "A=M"
                    "M=D"
                )?;
                Ok(())
            }
            Some(SegmentSymbol::Temp) => {
                self.write_pop_to_d()?;
                write!(self.output_file, "@{}\nM=D\n", 5 + index)?;
                Ok(())
            }
            Some(SegmentSymbol::Pointer) => {
                let reg = pointer_register(index)?;
                self.write_pop_to_d()?;
                write!(self.output_file, "@{reg}\nM=D\n")?;
                Ok(())
            }
            Some(SegmentSymbol::Static) => {
                let address = self.static_address(index);
                self.write_pop_to_d()?;
                write!(self.output_file, "@{address}\nM=D\n")?;
                Ok(())
            }
            Some(SegmentSymbol::Constant) | None => {
                Err(CodeWriterError::UnknownSegment(segment.to_string()))
            }
        }
    }

    /// Resolves `static i` to a RAM address, allocating lazily (starting at
    /// 16) on first sight. Namespaced by the current file so two files may
    /// both use `static 0` without colliding.
    fn static_address(&mut self, index: i32) -> u16 {
        let key = format!("{}.{}", self.current_file_namespace, index);
        self.statics.get_or_insert(&key)
    }

    pub fn write_label(&mut self, label: &str) -> Result<(), CodeWriterError> {
        writeln!(self.output_file, "({})", self.scoped_label(label))?;
        Ok(())
    }

    pub fn write_goto(&mut self, label: &str) -> Result<(), CodeWriterError> {
        write!(self.output_file, "@{}\n0;JMP\n", self.scoped_label(label))?;
        Ok(())
    }

    /// Pops the stack; jumps if the popped value is non-zero (Jack's `true`
    /// is `-1`, so any non-zero value must branch, not just `-1`).
    pub fn write_if_goto(&mut self, label: &str) -> Result<(), CodeWriterError> {
        self.write_pop_to_d()?;
        write!(self.output_file, "@{}\nD;JNE\n", self.scoped_label(label))?;
        Ok(())
    }

    fn scoped_label(&self, label: &str) -> String {
        format!("{}.{}", self.current_function, label)
    }

    /// `function f k`: emit label `f`, then push `k` zeros for the locals.
    pub fn write_function(&mut self, name: &str, n_locals: u16) -> Result<(), CodeWriterError> {
        self.current_function.clear();
        self.current_function.push_str(name);
        self.return_counter = 0;

        writeln!(self.output_file, "({name})")?;
        for _ in 0..n_locals {
            write!(self.output_file, "@0\nD=A\n")?;
            self.write_push_d()?;
        }
        Ok(())
    }

    /// `call f n`: push the calling frame, rebind `ARG`/`LCL`, jump to `f`.
    pub fn write_call(&mut self, name: &str, n_args: u16) -> Result<(), CodeWriterError> {
        let return_label = format!("{}$ret.{}", self.current_function, self.return_counter);
        self.return_counter += 1;

        write!(self.output_file, "@{return_label}\nD=A\n")?;
        self.write_push_d()?;
        for pointer in ["LCL", "ARG", "THIS", "THAT"] {
            write!(self.output_file, "@{pointer}\nD=M\n")?;
            self.write_push_d()?;
        }

        // ARG = SP - 5 - n_args
        write!(
            self.output_file,
            "@SP\nD=M\n@{}\nD=D-A\n@ARG\nM=D\n",
            5 + n_args
        )?;
        // LCL = SP
        write_asm!(self.output_file,
            "@SP"
            "D=M"
            "@LCL"
            "M=D"
        )?;

        write!(self.output_file, "@{name}\n0;JMP\n")?;
        writeln!(self.output_file, "({return_label})")?;
        Ok(())
    }

    /// `return`: restore the caller's frame and jump back. `retAddr` is
    /// saved into a scratch register before `RAM[ARG]` is overwritten,
    /// since when `n_args == 0` that slot IS `frame - 5`.
    pub fn write_return(&mut self) -> Result<(), CodeWriterError> {
        write_asm!(self.output_file,
            "@LCL"
            "D=M"
            "@R13"
            "M=D"
        )?; // R13 = frame
        write_asm!(self.output_file,
            "@5"
            "A=D-A"
            "D=M"
            "@R14"
            "M=D"
        )?; // R14 = retAddr = *(frame - 5); note D still holds `frame` from above

        self.write_pop_to_d()?;
        write_asm!(self.output_file,
            "@ARG"
            "A=M"
            "M=D"
        )?; // *ARG = pop()

        write_asm!(self.output_file,
            "@ARG"
            "D=M+1"
            "@SP"
            "M=D"
        )?; // SP = ARG + 1

        for (offset, pointer) in [(1, "THAT"), (2, "THIS"), (3, "ARG"), (4, "LCL")] {
            write!(
                self.output_file,
                "@R13\nD=M\n@{offset}\nA=D-A\nD=M\n@{pointer}\nM=D\n"
            )?;
        }

        write_asm!(self.output_file,
            "@R14"
            "A=M"
            "0;JMP"
        )?;
        Ok(())
    }

    #[inline]
    fn write_push_d(&mut self) -> Result<(), CodeWriterError> {
        write_asm!(self.output_file,
            "@SP"
            "M=M+1"
            "A=M-1"
            "M=D"
        )?;
        Ok(())
    }

    #[inline]
    fn write_pop_to_d(&mut self) -> Result<(), CodeWriterError> {
        write_asm!(self.output_file,
            "@SP"
            "AM=M-1"
            "D=M"
        )?;
        Ok(())
    }

    #[inline]
    pub fn flush(&mut self) -> Result<(), std::io::Error> {
        self.output_file.flush()
    }
}

/// `pointer 0`/`pointer 1` address `RAM[THIS]`/`RAM[THAT]` directly — the
/// pointer cell itself, not a base+offset computation.
fn pointer_register(index: i32) -> Result<&'static str, CodeWriterError> {
    match index {
        0 => Ok("THIS"),
        1 => Ok("THAT"),
        other => Err(CodeWriterError::InvalidPointerIndex(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn temp_path(tag: &str) -> std::path::PathBuf {
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        let unique = COUNTER.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!(
            "vmtranslator_codewriter_test_{tag}_{}_{unique}.asm",
            std::process::id()
        ))
    }

    fn read_and_cleanup(path: &std::path::Path) -> String {
        let mut contents = String::new();
        File::open(path).unwrap().read_to_string(&mut contents).unwrap();
        std::fs::remove_file(path).unwrap();
        contents
    }

    #[test]
    fn rejects_unknown_arithmetic_command() {
        let path = temp_path("unknown_arith");
        let mut writer = CodeWriter::new(path.to_str().unwrap()).unwrap();
        let err = writer.write_arithmetic("bogus").unwrap_err();
        writer.flush().unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(err.to_string(), "unknown arithmetic command 'bogus'");
    }

    #[test]
    fn rejects_unknown_segment() {
        let path = temp_path("unknown_segment");
        let mut writer = CodeWriter::new(path.to_str().unwrap()).unwrap();
        let err = writer.write_push_pop("push", "bogus", 0).unwrap_err();
        writer.flush().unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(err.to_string(), "unknown segment 'bogus'");
    }

    #[test]
    fn rejects_out_of_range_pointer_index() {
        let path = temp_path("bad_pointer");
        let mut writer = CodeWriter::new(path.to_str().unwrap()).unwrap();
        let err = writer.write_push_pop("push", "pointer", 2).unwrap_err();
        writer.flush().unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(err.to_string(), "pointer segment index must be 0 or 1, got 2");
    }

    #[test]
    fn pointer_segments_address_this_and_that_directly() {
        let path = temp_path("pointer_direct");
        let mut writer = CodeWriter::new(path.to_str().unwrap()).unwrap();
        writer.write_push_pop("push", "pointer", 0).unwrap();
        writer.write_push_pop("pop", "pointer", 1).unwrap();
        writer.flush().unwrap();
        let contents = read_and_cleanup(&path);

        // pointer 0 reads RAM[THIS] directly, not THIS + 0 as an index.
        assert!(contents.contains("@THIS\nD=M"));
        // pointer 1 writes RAM[THAT] directly.
        assert!(contents.contains("@THAT\nM=D"));
    }

    #[test]
    fn statics_are_namespaced_per_file() {
        let path = temp_path("statics");
        let mut writer = CodeWriter::new(path.to_str().unwrap()).unwrap();
        writer.set_filename("Foo.vm");
        let foo0 = writer.static_address(0);
        writer.set_filename("Bar.vm");
        let bar0 = writer.static_address(0);
        writer.set_filename("Foo.vm");
        let foo0_again = writer.static_address(0);

        assert_eq!(foo0, 16);
        assert_eq!(bar0, 17);
        assert_eq!(foo0_again, foo0);

        writer.flush().unwrap();
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn call_return_label_counter_resets_per_function() {
        let path = temp_path("ret_counter");
        let mut writer = CodeWriter::new(path.to_str().unwrap()).unwrap();
        writer.write_function("Main.main", 0).unwrap();
        writer.write_call("Foo.bar", 0).unwrap();
        writer.write_call("Foo.baz", 0).unwrap();
        writer.write_function("Other.fn", 0).unwrap();
        writer.write_call("Foo.bar", 0).unwrap();
        writer.flush().unwrap();
        let contents = read_and_cleanup(&path);

        assert!(contents.contains("(Main.main$ret.0)"));
        assert!(contents.contains("(Main.main$ret.1)"));
        assert!(contents.contains("(Other.fn$ret.0)"));
    }
}
