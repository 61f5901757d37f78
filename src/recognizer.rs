//! Backtracking syntax recognizer for B
//!
//! Walks a materialized token sequence against the B grammar and answers two
//! questions: did the whole program match, and how deep into the sequence did
//! any attempted parse get.  No AST is built; every grammar rule is a boolean
//! method over a shared cursor that saves the cursor on entry and restores it
//! before trying the next alternative.
//!
//! The grammar's natural left recursion (`rvalue := rvalue binary rvalue`,
//! `lvalue := rvalue [ rvalue ]`) is eliminated the standard way: each of
//! `rvalue` and `lvalue` is a base alternative followed by a greedy suffix
//! rule that repeatedly extends the parse and ends in ε.  No operator
//! precedence is encoded; `binary` accepts every operator uniformly, since
//! this recognizer only validates well-formedness.

use crate::lexer::Token;

/// Binary operators, in the order the grammar tries them.
const BINARY_OPS: [Token; 15] = [
    Token::Pipe,
    Token::Amp,
    Token::EqEq,
    Token::NotEq,
    Token::Lt,
    Token::Le,
    Token::Gt,
    Token::Ge,
    Token::LtLt,
    Token::GtGt,
    Token::Minus,
    Token::Plus,
    Token::Percent,
    Token::Star,
    Token::Slash,
];

/// Backtracking recursive-descent recognizer over a token sequence.
///
/// The sequence must be terminated by [`Token::Eof`]; the lexer's
/// `tokenize` produces exactly that shape.
pub struct Recognizer {
    tokens: Vec<Token>,
    next: usize,
    max_next: usize,
}

impl Recognizer {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            next: 0,
            max_next: 0,
        }
    }

    /// Run recognition once over the whole sequence.
    pub fn run(&mut self) -> bool {
        self.program()
    }

    /// Deepest token index any attempted parse path tried to consume, even
    /// along alternatives that later failed and rolled back.  Only grows; on
    /// acceptance it equals the index of the terminating `Eof`.
    pub fn furthest(&self) -> usize {
        self.max_next
    }

    // ===== Cursor primitives =====

    /// Match a single terminal by tag.  The high-water mark is recorded
    /// before the comparison, so even a failed attempt counts as having
    /// reached this index.
    fn match_token(&mut self, token: &Token) -> bool {
        self.max_next = self.max_next.max(self.next);
        match self.tokens.get(self.next) {
            Some(t) => {
                self.next += 1;
                std::mem::discriminant(t) == std::mem::discriminant(token)
            }
            None => false,
        }
    }

    fn match_name(&mut self) -> bool {
        self.match_token(&Token::Name(String::new()))
    }

    /// Ordered choice: try each alternative from the same saved cursor; the
    /// first that matches wins.  Restores the cursor between attempts and on
    /// overall failure, so callers never see a failed rule consume input.
    fn first_of(&mut self, alternatives: &[fn(&mut Self) -> bool]) -> bool {
        let save = self.next;
        for alternative in alternatives {
            self.next = save;
            if alternative(self) {
                return true;
            }
        }
        self.next = save;
        false
    }

    // ===== Grammar rules =====

    // program := {definition}0 end-of-input
    fn program(&mut self) -> bool {
        let mut save = self.next;
        while self.definition() {
            save = self.next;
        }
        self.next = save;
        self.match_token(&Token::Eof)
    }

    // definition := name ( simple | function )
    fn definition(&mut self) -> bool {
        if !self.match_name() {
            return false;
        }
        let save = self.next;
        if self.simple_definition() {
            return true;
        }
        self.next = save;
        self.function_definition()
    }

    // name {[ {constant}01 ]}01 {ival {, ival}0}01 ;
    fn simple_definition(&mut self) -> bool {
        let save = self.next;
        if self.match_token(&Token::LBracket) {
            self.constant(); // optional vector size
            if !self.match_token(&Token::RBracket) {
                self.next = save;
            }
        } else {
            self.next = save;
        }

        let mut save = self.next;
        if self.ival() {
            save = self.next;
            while self.match_token(&Token::Comma) && self.ival() {
                save = self.next;
            }
        }
        self.next = save;
        self.match_token(&Token::Semicolon)
    }

    // name ( {name {, name}0}01 ) statement
    fn function_definition(&mut self) -> bool {
        if !self.match_token(&Token::LParen) {
            return false;
        }
        let mut save = self.next;
        if self.match_name() {
            save = self.next;
            while self.match_token(&Token::Comma) && self.match_name() {
                save = self.next;
            }
        }
        self.next = save;
        self.match_token(&Token::RParen) && self.statement()
    }

    fn statement(&mut self) -> bool {
        self.first_of(&[
            Self::auto_statement,
            Self::extrn_statement,
            Self::label_statement,
            Self::case_statement,
            Self::compound_statement,
            Self::if_statement,
            Self::while_statement,
            Self::switch_statement,
            Self::goto_statement,
            Self::return_statement,
            Self::rvalue_statement,
        ])
    }

    // auto name {constant}01 {, name {constant}01}0 ; statement
    fn auto_statement(&mut self) -> bool {
        if !self.match_token(&Token::Auto) || !self.match_name() {
            return false;
        }
        self.constant(); // optional size
        let mut save = self.next;
        while self.match_token(&Token::Comma) && self.match_name() {
            self.constant();
            save = self.next;
        }
        self.next = save;
        self.match_token(&Token::Semicolon) && self.statement()
    }

    // extrn name {, name}0 ; statement
    fn extrn_statement(&mut self) -> bool {
        if !self.match_token(&Token::Extrn) || !self.match_name() {
            return false;
        }
        let mut save = self.next;
        while self.match_token(&Token::Comma) && self.match_name() {
            save = self.next;
        }
        self.next = save;
        self.match_token(&Token::Semicolon) && self.statement()
    }

    // name : statement
    fn label_statement(&mut self) -> bool {
        self.match_name() && self.match_token(&Token::Colon) && self.statement()
    }

    // case constant : statement
    fn case_statement(&mut self) -> bool {
        self.match_token(&Token::Case)
            && self.constant()
            && self.match_token(&Token::Colon)
            && self.statement()
    }

    // { {statement}0 }
    fn compound_statement(&mut self) -> bool {
        if !self.match_token(&Token::LBrace) {
            return false;
        }
        let mut save = self.next;
        while self.statement() {
            save = self.next;
        }
        self.next = save;
        self.match_token(&Token::RBrace)
    }

    // if ( rvalue ) statement {else statement}01
    fn if_statement(&mut self) -> bool {
        if !self.match_token(&Token::If)
            || !self.match_token(&Token::LParen)
            || !self.rvalue()
            || !self.match_token(&Token::RParen)
            || !self.statement()
        {
            return false;
        }
        let save = self.next;
        if !(self.match_token(&Token::Else) && self.statement()) {
            self.next = save;
        }
        true
    }

    // while ( rvalue ) statement
    fn while_statement(&mut self) -> bool {
        self.match_token(&Token::While)
            && self.match_token(&Token::LParen)
            && self.rvalue()
            && self.match_token(&Token::RParen)
            && self.statement()
    }

    // switch rvalue statement
    fn switch_statement(&mut self) -> bool {
        self.match_token(&Token::Switch) && self.rvalue() && self.statement()
    }

    // goto rvalue ;
    fn goto_statement(&mut self) -> bool {
        self.match_token(&Token::Goto) && self.rvalue() && self.match_token(&Token::Semicolon)
    }

    // return {( rvalue )}01 ;
    fn return_statement(&mut self) -> bool {
        if !self.match_token(&Token::Return) {
            return false;
        }
        let save = self.next;
        if !(self.match_token(&Token::LParen)
            && self.rvalue()
            && self.match_token(&Token::RParen))
        {
            self.next = save;
        }
        self.match_token(&Token::Semicolon)
    }

    // {rvalue}01 ;
    fn rvalue_statement(&mut self) -> bool {
        self.rvalue(); // optional
        self.match_token(&Token::Semicolon)
    }

    // constant := numeric_constant | char_constant | string_literal
    fn constant(&mut self) -> bool {
        self.first_of(&[
            |r| r.match_token(&Token::NumericConstant(String::new())),
            |r| r.match_token(&Token::CharConstant(String::new())),
            |r| r.match_token(&Token::StringLiteral(String::new())),
        ])
    }

    // rvalue := base-alternative rvalue-suffix
    //
    // The base alternatives are tried in fixed order; the suffix rule ends in
    // ε and therefore never fails.
    fn rvalue(&mut self) -> bool {
        self.first_of(&[
            Self::paren_rvalue,
            Self::assignment_rvalue,
            Self::constant_rvalue,
            Self::prefix_inc_dec_rvalue,
            Self::postfix_inc_dec_rvalue,
            Self::lvalue_rvalue,
            Self::unary_rvalue,
            Self::address_rvalue,
        ]) && self.rvalue_suffix()
    }

    // ( rvalue )
    fn paren_rvalue(&mut self) -> bool {
        self.match_token(&Token::LParen) && self.rvalue() && self.match_token(&Token::RParen)
    }

    // lvalue assign rvalue
    fn assignment_rvalue(&mut self) -> bool {
        self.lvalue() && self.assign() && self.rvalue()
    }

    fn constant_rvalue(&mut self) -> bool {
        self.constant()
    }

    // inc-dec lvalue
    fn prefix_inc_dec_rvalue(&mut self) -> bool {
        self.inc_dec() && self.lvalue()
    }

    // lvalue inc-dec
    fn postfix_inc_dec_rvalue(&mut self) -> bool {
        self.lvalue() && self.inc_dec()
    }

    fn lvalue_rvalue(&mut self) -> bool {
        self.lvalue()
    }

    // unary rvalue
    fn unary_rvalue(&mut self) -> bool {
        self.unary() && self.rvalue()
    }

    // & lvalue
    fn address_rvalue(&mut self) -> bool {
        self.match_token(&Token::Amp) && self.lvalue()
    }

    // rvalue-suffix := binary rvalue rvalue-suffix
    //                | ? rvalue : rvalue rvalue-suffix
    //                | call-suffix rvalue-suffix
    //                | ε
    fn rvalue_suffix(&mut self) -> bool {
        let save = self.next;
        if self.binary() && self.rvalue() && self.rvalue_suffix() {
            return true;
        }
        self.next = save;
        if self.match_token(&Token::Question)
            && self.rvalue()
            && self.match_token(&Token::Colon)
            && self.rvalue()
            && self.rvalue_suffix()
        {
            return true;
        }
        self.next = save;
        if self.call_suffix() && self.rvalue_suffix() {
            return true;
        }
        self.next = save;
        true
    }

    // call-suffix := ( {rvalue {, rvalue}0}01 )
    fn call_suffix(&mut self) -> bool {
        if !self.match_token(&Token::LParen) {
            return false;
        }
        let mut save = self.next;
        if self.rvalue() {
            save = self.next;
            while self.match_token(&Token::Comma) && self.rvalue() {
                save = self.next;
            }
        }
        self.next = save;
        self.match_token(&Token::RParen)
    }

    // lvalue := name lvalue-suffix | * rvalue lvalue-suffix
    fn lvalue(&mut self) -> bool {
        let save = self.next;
        if self.match_name() && self.lvalue_suffix() {
            return true;
        }
        self.next = save;
        if self.match_token(&Token::Star) && self.rvalue() && self.lvalue_suffix() {
            return true;
        }
        self.next = save;
        false
    }

    // lvalue-suffix := assign rvalue [ rvalue ] lvalue-suffix
    //                | inc-dec [ rvalue ] lvalue-suffix
    //                | [ rvalue ] lvalue-suffix
    //                | ε
    fn lvalue_suffix(&mut self) -> bool {
        let save = self.next;
        if self.assign()
            && self.rvalue()
            && self.match_token(&Token::LBracket)
            && self.rvalue()
            && self.match_token(&Token::RBracket)
            && self.lvalue_suffix()
        {
            return true;
        }
        self.next = save;
        if self.inc_dec()
            && self.match_token(&Token::LBracket)
            && self.rvalue()
            && self.match_token(&Token::RBracket)
            && self.lvalue_suffix()
        {
            return true;
        }
        self.next = save;
        if self.match_token(&Token::LBracket)
            && self.rvalue()
            && self.match_token(&Token::RBracket)
            && self.lvalue_suffix()
        {
            return true;
        }
        self.next = save;
        true
    }

    // assign := = {binary}01
    fn assign(&mut self) -> bool {
        if !self.match_token(&Token::Eq) {
            return false;
        }
        let save = self.next;
        if !self.binary() {
            self.next = save;
        }
        true
    }

    // inc-dec := ++ | --
    fn inc_dec(&mut self) -> bool {
        self.first_of(&[
            |r| r.match_token(&Token::PlusPlus),
            |r| r.match_token(&Token::MinusMinus),
        ])
    }

    // unary := - | !
    fn unary(&mut self) -> bool {
        self.first_of(&[
            |r| r.match_token(&Token::Minus),
            |r| r.match_token(&Token::Bang),
        ])
    }

    fn binary(&mut self) -> bool {
        let save = self.next;
        for op in &BINARY_OPS {
            self.next = save;
            if self.match_token(op) {
                return true;
            }
        }
        self.next = save;
        false
    }

    // ival := constant | name
    fn ival(&mut self) -> bool {
        self.first_of(&[Self::constant, Self::match_name])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn tokens(source: &str) -> Vec<Token> {
        Lexer::new(source.as_bytes()).tokenize().unwrap()
    }

    fn recognize(source: &str) -> (bool, usize) {
        let mut recognizer = Recognizer::new(tokens(source));
        let accepted = recognizer.run();
        (accepted, recognizer.furthest())
    }

    #[test]
    fn test_empty_program_is_valid() {
        let (accepted, furthest) = recognize("");
        assert!(accepted);
        assert_eq!(furthest, 0);
    }

    #[test]
    fn test_simple_function() {
        let (accepted, _) = recognize("main() { auto x; x = 1; return(x); }");
        assert!(accepted);
    }

    #[test]
    fn test_furthest_equals_eof_index_on_acceptance() {
        let source = "main() { auto x; x = 1; return(x); }";
        let sequence = tokens(source);
        let (accepted, furthest) = recognize(source);
        assert!(accepted);
        assert_eq!(furthest, sequence.len() - 1);
    }

    #[test]
    fn test_missing_paren_rejected_with_position() {
        // tokens: main ( ) { if ( x } }  — the ')' is required where the
        // first '}' (index 7) sits.
        let (accepted, furthest) = recognize("main() { if (x } }");
        assert!(!accepted);
        assert_eq!(furthest, 7);
    }

    #[test]
    fn test_vector_definition() {
        assert!(recognize("v[10] 1, 2, 3;").0);
        assert!(recognize("v[] 'a';").0);
        assert!(recognize("v;").0);
        assert!(recognize("v \"init\";").0);
    }

    #[test]
    fn test_function_with_parameters() {
        assert!(recognize("add(a, b) return(a + b);").0);
    }

    #[test]
    fn test_extrn_and_labels() {
        assert!(recognize("main() { extrn putchar, getchar; loop: goto loop; }").0);
    }

    #[test]
    fn test_switch_and_case() {
        assert!(recognize("main() { switch x { case 1: ; case 'a': ; } }").0);
    }

    #[test]
    fn test_while_loop() {
        assert!(recognize("main() { while (x < 10) x = x + 1; }").0);
    }

    #[test]
    fn test_conditional_expression() {
        assert!(recognize("main() { x = a ? b : c; }").0);
    }

    #[test]
    fn test_function_call_expression() {
        assert!(recognize("main() { putchar('a'); f(x, y + 1); g(); }").0);
    }

    #[test]
    fn test_binary_chains_without_precedence() {
        // rvalue must accept any operator mix; no precedence is enforced.
        let mut r = Recognizer::new(tokens("a+b*c"));
        assert!(r.rvalue());
        let mut r = Recognizer::new(tokens("a+b+c"));
        assert!(r.rvalue());
    }

    #[test]
    fn test_binary_requires_left_operand() {
        // '+' is not a unary operator in B; a leading binary must fail.
        let mut r = Recognizer::new(tokens("+a"));
        assert!(!r.rvalue());
    }

    #[test]
    fn test_unary_and_address() {
        assert!(recognize("main() { x = -y; x = !y; x = &y; x = *p; }").0);
    }

    #[test]
    fn test_indexing_and_compound_lvalues() {
        assert!(recognize("main() { x[1] = y; *p = 2; }").0);
    }

    #[test]
    fn test_goto_terminated_by_semicolon() {
        assert!(recognize("main() { goto done; done: ; }").0);
        assert!(!recognize("main() { goto done, }").0);
    }

    #[test]
    fn test_missing_semicolon_rejected() {
        assert!(!recognize("main() { auto x }").0);
    }

    #[test]
    fn test_unknown_token_rejected() {
        assert!(!recognize("main() { x = @; }").0);
    }

    #[test]
    fn test_furthest_only_grows_with_longer_valid_prefix() {
        let (_, shallow) = recognize("main() { @ }");
        let (_, deeper) = recognize("main() { x = 1; @ }");
        assert!(deeper > shallow);
    }
}
